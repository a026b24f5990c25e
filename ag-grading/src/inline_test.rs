//! Inline-test execution and outcome classification (spec.md §4.5 step e).

/// Builds the `python3 <Name>_inlinetest.py` command.
pub fn inline_test_command(inlinetest_file_name: &str) -> Vec<String> {
    vec!["python3".to_string(), inlinetest_file_name.to_string()]
}

/// Classifies one inline test's captured output into `(passed, error)`
/// (spec.md §3 Outcome: "For inline tests: `passed` plus optional `error`
/// string accumulated from one or more OK/FAIL/ERROR markers and from
/// syntax-error and timeout detectors").
pub fn classify_inline_test_output(output: &str) -> (bool, Option<String>) {
    if ag_inline::is_timed_out(output) {
        return (false, Some("Time out.".to_string()));
    }

    let mut saw_ok = false;
    let mut messages = Vec::new();
    for marker in ag_inline::scan_markers(output) {
        match marker {
            ag_inline::Marker::Ok => saw_ok = true,
            ag_inline::Marker::Fail(msg) | ag_inline::Marker::Error(msg) => messages.push(msg),
        }
    }
    if let Some(syntax) = ag_inline::scan_syntax_error(output) {
        messages.push(format!("SyntaxError: {syntax}"));
    }

    let passed = saw_ok && messages.is_empty();
    let error = if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    };
    (passed, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_run_has_no_error() {
        let (passed, error) = classify_inline_test_output("OK{{}}\n");
        assert!(passed);
        assert!(error.is_none());
    }

    #[test]
    fn failing_assertion_carries_message() {
        let out = "While executing inline test: FAIL{{2 != 1}}\n";
        let (passed, error) = classify_inline_test_output(out);
        assert!(!passed);
        assert_eq!(error.as_deref(), Some("2 != 1"));
    }

    #[test]
    fn timeout_overrides_everything() {
        let out = "time limit exceeded, Killing it\nOK{{}}\n";
        let (passed, error) = classify_inline_test_output(out);
        assert!(!passed);
        assert_eq!(error.as_deref(), Some("Time out."));
    }

    #[test]
    fn syntax_error_without_markers_fails() {
        let out = "Traceback...\nSyntaxError: invalid syntax\n";
        let (passed, error) = classify_inline_test_output(out);
        assert!(!passed);
        assert!(error.unwrap().contains("SyntaxError"));
    }
}
