//! Inline-test script assembler (spec.md §4.3): given a context source, a
//! submission source, and an inline-test body, emits one self-contained
//! Python script whose execution produces machine-parseable `OK{{}}` /
//! `FAIL{{msg}}` / `ERROR{{msg}}` markers.
//!
//! Template-based text assembly in the manner of `marker::feedback::
//! auto_feedback::AutoFeedback` (string building over small fixed shapes)
//! rather than a general templating engine — the shape here is fixed by
//! spec.md §4.3's three `try/except` sections and never varies per call.

use once_cell::sync::Lazy;
use regex::Regex;

/// Indents every line of `text` by two spaces (spec.md §4.3: "Indent the
/// three sections by two spaces so each lives inside an independent
/// try/except block").
fn indent(text: &str) -> String {
    if text.is_empty() {
        return "    pass".to_string();
    }
    text.lines()
        .map(|l| if l.is_empty() { String::new() } else { format!("  {l}") })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assembles the self-contained inline-test script (spec.md §4.3).
///
/// `context` is optional (an exercise may have no preceding context cells);
/// `submission` and `inline_test` are always present.
pub fn assemble_inline_test(context: Option<&str>, submission: &str, inline_test: &str) -> String {
    let mut script = String::new();
    script.push_str("import sys\n\n");

    if let Some(context) = context {
        script.push_str("try:\n");
        script.push_str(&indent(context));
        script.push_str("\nexcept Exception as e:\n");
        script.push_str("  print(\"While executing context: ERROR{{\" + str(e) + \"}}\")\n");
        script.push_str("  raise\n\n");
    }

    script.push_str("try:\n");
    script.push_str(&indent(submission));
    script.push_str("\nexcept Exception as e:\n");
    script.push_str(
        "  print(\"While executing submission: FAIL{{\" + type(e).__name__ + \": \" + str(e) + \"}}\")\n",
    );
    script.push_str("  sys.exit(1)\n\n");

    script.push_str("try:\n");
    script.push_str(&indent(inline_test));
    script.push_str("\nexcept AssertionError as e:\n");
    script.push_str("  print(\"While executing inline test: FAIL{{\" + str(e) + \"}}\")\n");
    script.push_str("  sys.exit(1)\n");
    script.push_str("except Exception as e:\n");
    script.push_str("  print(\"While executing inline test: ERROR{{\" + str(e) + \"}}\")\n");
    script.push_str("  raise\n\n");

    script.push_str("print(\"OK{{}}\")\n");
    script
}

/// One `(OK|ERROR|FAIL){{…}}` marker recovered from captured runner output
/// (spec.md §4.3 "double-brace syntax... parseable by a regex").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Ok,
    Fail(String),
    Error(String),
}

static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(OK|ERROR|FAIL)\{\{(.*?)\}\}").unwrap());

static SYNTAX_ERROR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^SyntaxError: (.+)$").unwrap());

/// Matches a wall-clock kill notice from the sandbox invoker (spec.md §4.4:
/// "a wall-clock kill is detected by matching the text fragment `time
/// limit` followed by `Killing it`").
static TIMEOUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)time limit.*Killing it").unwrap());

/// Scans captured runner output for every `(OK|ERROR|FAIL){{…}}` marker this
/// script's `OK{{}}`/`FAIL{{…}}`/`ERROR{{…}}` prints emit (spec.md §4.5e).
pub fn scan_markers(output: &str) -> Vec<Marker> {
    MARKER_RE
        .captures_iter(output)
        .map(|c| {
            let body = c.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
            match &c[1] {
                "OK" => Marker::Ok,
                "FAIL" => Marker::Fail(body),
                "ERROR" => Marker::Error(body),
                _ => unreachable!(),
            }
        })
        .collect()
}

/// The first `SyntaxError: …` line in captured output, if any (spec.md
/// §4.5e).
pub fn scan_syntax_error(output: &str) -> Option<String> {
    SYNTAX_ERROR_RE
        .captures(output)
        .map(|c| c[1].trim().to_string())
}

/// True when the output carries the sandbox's wall-clock-kill fragment
/// (spec.md §4.4, §4.5e).
pub fn is_timed_out(output: &str) -> bool {
    TIMEOUT_RE.is_match(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_three_indented_try_blocks() {
        let script = assemble_inline_test(Some("x = 0"), "x = 1", "assert x == 1");
        assert!(script.contains("try:\n  x = 0\nexcept Exception as e:"));
        assert!(script.contains("  x = 1\nexcept Exception as e:"));
        assert!(script.contains("  assert x == 1\nexcept AssertionError as e:"));
        assert!(script.ends_with("print(\"OK{{}}\")\n"));
    }

    #[test]
    fn omits_context_block_when_absent() {
        let script = assemble_inline_test(None, "x = 1", "assert x == 1");
        assert!(!script.contains("While executing context"));
    }

    #[test]
    fn scans_ok_marker() {
        assert_eq!(scan_markers("some noise\nOK{{}}\n"), vec![Marker::Ok]);
    }

    #[test]
    fn scans_fail_marker_with_embedded_single_braces() {
        let out = "While executing inline test: FAIL{{expected {1} got {2}}}";
        let markers = scan_markers(out);
        assert_eq!(markers, vec![Marker::Fail("expected {1} got {2}".into())]);
    }

    #[test]
    fn detects_timeout_fragment() {
        let out = "running...\ntime limit exceeded, Killing it\n";
        assert!(is_timed_out(out));
    }

    #[test]
    fn extracts_syntax_error_line() {
        let out = "Traceback ...\nSyntaxError: invalid syntax\n";
        assert_eq!(scan_syntax_error(out).as_deref(), Some("invalid syntax"));
    }
}
