//! `%%template <Name>` wrapper generation (spec.md §4.2 table, `%%template`
//! row): the cell body is a report-template snippet written by the
//! assignment author; at autograder-build time it is wrapped in a small
//! stdin/stdout driver script so it can be invoked as an opaque subprocess
//! by the grading engine (spec.md §9 "Embedded templating languages inside
//! markup" — kept as an opaque script invoked via subprocess, the option
//! the design notes call out as a valid implementation choice).

/// Wraps a template cell's body into a standalone script that reads a JSON
/// object (`results`, `logs`) from stdin, renders the body as a Jinja2
/// template over that object plus the submission source, and writes the
/// rendered HTML to stdout.
pub fn wrap_report_template(body: &str) -> String {
    format!(
        "import sys\nimport json\nimport html\nfrom jinja2 import Template\n\n\
         def _highlight(source):\n    try:\n        from pygments import highlight\n        from pygments.lexers import PythonLexer\n        from pygments.formatters import HtmlFormatter\n        return highlight(source, PythonLexer(), HtmlFormatter(noclasses=True))\n    except Exception:\n        return '<pre>' + html.escape(source) + '</pre>'\n\n\
         def main():\n    payload = json.load(sys.stdin)\n    submission_source = payload.get('submission_source', '')\n    payload['submission_html'] = _highlight(submission_source)\n    template = Template('''{body}''')\n    sys.stdout.write(template.render(**payload))\n\n\
         if __name__ == '__main__':\n    main()\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_body_as_jinja_template() {
        let out = wrap_report_template("<p>{{ results }}</p>");
        assert!(out.contains("<p>{{ results }}</p>"));
        assert!(out.contains("json.load(sys.stdin)"));
    }
}
