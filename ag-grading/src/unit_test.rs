//! Unit-test execution and outcome classification (spec.md §4.5 step d).
//!
//! Runner output is parsed heuristically by regex rather than by
//! instrumenting the test runner (spec.md §9 "Regex-based outcome
//! parsing") — brittle by design, kept exactly as specified.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// `(test[A-Za-z0-9_]+) \(([\w-]+)\.(\w+)\) \.\.\. (ok|FAIL|ERROR)` (spec.md
/// §4.5 step d).
static LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(test[A-Za-z0-9_]+) \(([\w-]+)\.(\w+)\) \.\.\. (ok|FAIL|ERROR)").unwrap());

/// Builds the `python3 -m unittest -v <ClassName>Test` command for a
/// `<ClassName>Test.py` file (spec.md §3 Asset tree, §4.5 step d: "Run all
/// `*Test.py` files via the test runner under the sandbox, with verbose
/// output"). `class_name` is the asset-tree key (the file's stem with the
/// trailing `Test` stripped); the module unittest needs to import is the
/// full file stem, so `Test` is put back on here.
pub fn unit_test_command(class_name: &str) -> Vec<String> {
    vec![
        "python3".to_string(),
        "-m".to_string(),
        "unittest".to_string(),
        "-v".to_string(),
        format!("{class_name}Test"),
    ]
}

/// Parses one `<ClassName>Test.py` run's captured output into the
/// per-method outcome map and the file's overall `passed` flag (spec.md
/// §4.5 step d, §3 Outcome: "a test group is marked not-passed if any
/// individual method failed, errored, or if no method outcomes were
/// recognized in the runner output").
pub fn classify_unit_test_output(output: &str, exit_code: Option<i32>) -> (bool, Map<String, Value>) {
    let mut methods = Map::new();
    let mut any_failed = false;

    for caps in LINE_RE.captures_iter(output) {
        let method = caps[1].to_string();
        let ok = &caps[4] == "ok";
        if !ok {
            any_failed = true;
        }
        methods.insert(method, Value::Bool(ok));
    }

    let passed = exit_code == Some(0) && !methods.is_empty() && !any_failed;
    (passed, methods)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
testAdd (FizzBuzzTest.FizzBuzzTest) ... ok
testSub (FizzBuzzTest.FizzBuzzTest) ... FAIL
testMul (FizzBuzzTest.FizzBuzzTest) ... ERROR

======================================================================
FAIL: testSub (FizzBuzzTest.FizzBuzzTest)
----------------------------------------------------------------------
AssertionError: 1 != 2

Ran 3 tests in 0.001s

FAILED (failures=1, errors=1)
";

    #[test]
    fn command_reattaches_test_suffix() {
        let cmd = unit_test_command("FizzBuzz");
        assert_eq!(cmd, vec!["python3", "-m", "unittest", "-v", "FizzBuzzTest"]);
    }

    #[test]
    fn recognizes_each_method_outcome() {
        let (passed, methods) = classify_unit_test_output(SAMPLE, Some(1));
        assert!(!passed);
        assert_eq!(methods.get("testAdd").unwrap(), &Value::Bool(true));
        assert_eq!(methods.get("testSub").unwrap(), &Value::Bool(false));
        assert_eq!(methods.get("testMul").unwrap(), &Value::Bool(false));
    }

    #[test]
    fn passes_only_when_zero_exit_and_all_methods_ok() {
        let output = "testAdd (FizzBuzzTest.FizzBuzzTest) ... ok\n\nOK\n";
        let (passed, methods) = classify_unit_test_output(output, Some(0));
        assert!(passed);
        assert_eq!(methods.len(), 1);
    }

    #[test]
    fn no_recognized_methods_is_not_passed_even_with_zero_exit() {
        let (passed, methods) = classify_unit_test_output("no test lines here", Some(0));
        assert!(!passed);
        assert!(methods.is_empty());
    }

    #[test]
    fn nonzero_exit_with_all_ok_methods_is_still_not_passed() {
        let output = "testAdd (FizzBuzzTest.FizzBuzzTest) ... ok\n";
        let (passed, _) = classify_unit_test_output(output, Some(2));
        assert!(!passed);
    }
}
