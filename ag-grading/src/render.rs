//! Syntax-highlighted (or safely-escaped) rendering of submission source and
//! per-test HTML fragments (spec.md §4.5e). Grounded on
//! `tlparse::parsers::generate_html_output`'s `syntect` usage, with the
//! `html-escape` fallback spec.md calls for explicitly ("syntax-highlighted
//! submission source or a safely-escaped `<pre>` fallback").

use once_cell::sync::Lazy;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Renders `source` as syntax-highlighted Python HTML, falling back to an
/// escaped `<pre>` block if highlighting fails for any reason.
pub fn highlight_python(source: &str) -> String {
    let render = || -> Result<String, syntect::Error> {
        let syntax = SYNTAX_SET
            .find_syntax_by_extension("py")
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
        highlighted_html_for_string(source, &SYNTAX_SET, syntax, &THEME_SET.themes["InspiredGitHub"])
    };
    render().unwrap_or_else(|_| escaped_pre(source))
}

pub fn escaped_pre(source: &str) -> String {
    format!("<pre>{}</pre>", html_escape::encode_text(source))
}

/// Renders one inline test's report fragment (spec.md §4.5e: "passed
/// status, optional error message, syntax-highlighted submission source or
/// a safely-escaped `<pre>` fallback, and optionally the raw log when
/// include-logs is set").
pub fn render_inline_fragment(
    test_name: &str,
    passed: bool,
    error: Option<&str>,
    submission_source: &str,
    log: Option<&str>,
) -> String {
    let glyph = if passed { "&#9989;" } else { "&#10060;" };
    let status_class = if passed { "pass" } else { "fail" };
    let mut html = format!(
        "<div class=\"inline-test {status_class}\"><h4>{glyph} {name}</h4>",
        name = html_escape::encode_text(test_name)
    );
    if let Some(err) = error {
        html.push_str(&format!(
            "<pre class=\"error\">{}</pre>",
            html_escape::encode_text(err)
        ));
    }
    html.push_str(&highlight_python(submission_source));
    if let Some(log) = log {
        html.push_str(&format!(
            "<details class=\"log\"><summary>log</summary><pre>{}</pre></details>",
            html_escape::encode_text(log)
        ));
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_python_source() {
        let html = highlight_python("def f():\n    return 1\n");
        assert!(html.contains("<pre"));
    }

    #[test]
    fn escapes_source_in_fallback() {
        let html = escaped_pre("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn fragment_includes_glyph_and_error() {
        let html = render_inline_fragment("basic", false, Some("2 != 1"), "x = 2", None);
        assert!(html.contains("&#10060;"));
        assert!(html.contains("2 != 1"));
        assert!(html.contains("fail"));
    }

    #[test]
    fn fragment_omits_log_unless_provided() {
        let html = render_inline_fragment("basic", true, None, "x = 1", None);
        assert!(!html.contains("class=\"log\""));
    }
}
