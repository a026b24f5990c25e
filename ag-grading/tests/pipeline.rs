//! End-to-end exercise of `GradingJob::grade` against a real sandbox
//! subprocess tree (a stand-in "sandbox" shell script that strips the
//! resource-limit flags and execs the real command, in the spirit of
//! `ag-sandbox`'s own tests, which drive `/bin/sh` directly rather than
//! mocking the process boundary).

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use ag_assets::AssetTree;
use ag_grading::GradingJob;
use ag_sandbox::SandboxInvoker;
use serde_json::{json, Value};

/// A "sandbox" binary that discards every flag before `--` and execs
/// whatever follows, with the test process's own `PATH` so `python3`
/// resolves the same way it does for the test runner itself.
fn write_stub_sandbox(dir: &Path) -> std::path::PathBuf {
    let path_var = std::env::var("PATH").unwrap_or_default();
    let script = format!(
        "#!/bin/sh\nwhile [ \"$1\" != \"--\" ]; do shift; done\nshift\nexport PATH=\"{path_var}\"\nexec \"$@\"\n"
    );
    let path = dir.join("fake_sandbox.sh");
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

const FIZZBUZZ_TEST: &str = "\
import unittest
from submission import fizzbuzz


class FizzBuzzTest(unittest.TestCase):
    def testThree(self):
        self.assertEqual(fizzbuzz(3), \"Fizz\")

    def testFive(self):
        self.assertEqual(fizzbuzz(5), \"Buzz\")

    def testFifteen(self):
        self.assertEqual(fizzbuzz(15), \"FizzBuzz\")
";

const PASSING_SUBMISSION: &str = "\
def fizzbuzz(n):
    if n % 15 == 0:
        return \"FizzBuzz\"
    if n % 3 == 0:
        return \"Fizz\"
    if n % 5 == 0:
        return \"Buzz\"
    return str(n)


probe = fizzbuzz(3)
";

const FAILING_SUBMISSION: &str = "\
def fizzbuzz(n):
    return str(n)


probe = fizzbuzz(3)
";

fn write_exercise_assets(exercise_dir: &Path) {
    fs::create_dir_all(exercise_dir).unwrap();
    fs::write(exercise_dir.join("FizzBuzzTest.py"), FIZZBUZZ_TEST).unwrap();
    fs::write(exercise_dir.join("empty_submission.py"), "# TODO: implement fizzbuzz\n").unwrap();
    fs::write(exercise_dir.join("basic_context.py"), "pass\n").unwrap();
    fs::write(exercise_dir.join("basic_inline.py"), "assert probe == \"Fizz\"\n").unwrap();
}

fn notebook_bytes(submission_id: &str, assignment_id: &str, exercise_id: &str, source: &str) -> Vec<u8> {
    let nb = json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {
            "submission_id": submission_id,
            "assignment_id": assignment_id,
            "user_hash": "user-abc",
        },
        "cells": [
            {
                "cell_type": "code",
                "metadata": { "exercise_id": exercise_id },
                "source": source,
                "outputs": [],
            }
        ],
    });
    serde_json::to_vec(&nb).unwrap()
}

fn job(assets_root: &Path, sandbox_bin: &Path, scratch_root: &Path) -> GradingJob {
    GradingJob::new(
        AssetTree::new(assets_root),
        SandboxInvoker::new(sandbox_bin),
        scratch_root,
    )
    .with_cleanup(false)
}

#[tokio::test]
async fn passing_submission_passes_unit_and_inline_tests() {
    let assets_root = tempfile::tempdir().unwrap();
    write_exercise_assets(&assets_root.path().join("hw1/ex1"));
    let sandbox_dir = tempfile::tempdir().unwrap();
    let sandbox_bin = write_stub_sandbox(sandbox_dir.path());
    let scratch_root = tempfile::tempdir().unwrap();

    let grading_job = job(assets_root.path(), &sandbox_bin, scratch_root.path());
    let bytes = notebook_bytes("sub-pass", "hw1", "ex1", PASSING_SUBMISSION);
    let report_bytes = grading_job.grade(&bytes).await;
    let report: Value = serde_json::from_slice(&report_bytes).unwrap();

    assert_eq!(report["submission_id"], "sub-pass");
    assert_eq!(report["assignment_id"], "hw1");
    let ex1 = &report["ex1"];
    assert_eq!(ex1["results"]["FizzBuzz"]["passed"], true);
    assert_eq!(ex1["results"]["FizzBuzz"]["testThree"], true);
    assert_eq!(ex1["results"]["basic"]["passed"], true);
    assert!(ex1["report"].as_str().unwrap().contains("pass"));
}

#[tokio::test]
async fn failing_submission_fails_unit_and_inline_tests() {
    let assets_root = tempfile::tempdir().unwrap();
    write_exercise_assets(&assets_root.path().join("hw1/ex1"));
    let sandbox_dir = tempfile::tempdir().unwrap();
    let sandbox_bin = write_stub_sandbox(sandbox_dir.path());
    let scratch_root = tempfile::tempdir().unwrap();

    let grading_job = job(assets_root.path(), &sandbox_bin, scratch_root.path());
    let bytes = notebook_bytes("sub-fail", "hw1", "ex1", FAILING_SUBMISSION);
    let report_bytes = grading_job.grade(&bytes).await;
    let report: Value = serde_json::from_slice(&report_bytes).unwrap();

    let ex1 = &report["ex1"];
    assert_eq!(ex1["results"]["FizzBuzz"]["passed"], false);
    assert_eq!(ex1["results"]["basic"]["passed"], false);
}

#[tokio::test]
async fn trivial_submission_short_circuits_without_running_tests() {
    let assets_root = tempfile::tempdir().unwrap();
    write_exercise_assets(&assets_root.path().join("hw1/ex1"));
    let sandbox_dir = tempfile::tempdir().unwrap();
    let sandbox_bin = write_stub_sandbox(sandbox_dir.path());
    let scratch_root = tempfile::tempdir().unwrap();

    let grading_job = job(assets_root.path(), &sandbox_bin, scratch_root.path());
    let bytes = notebook_bytes("sub-empty", "hw1", "ex1", "# TODO: implement fizzbuzz\n");
    let report_bytes = grading_job.grade(&bytes).await;
    let report: Value = serde_json::from_slice(&report_bytes).unwrap();

    let ex1 = &report["ex1"];
    assert!(ex1["report"].as_str().unwrap().contains("empty submission"));
    assert!(ex1.get("results").is_none());
}

#[tokio::test]
async fn missing_submission_id_produces_error_report() {
    let assets_root = tempfile::tempdir().unwrap();
    let sandbox_dir = tempfile::tempdir().unwrap();
    let sandbox_bin = write_stub_sandbox(sandbox_dir.path());
    let scratch_root = tempfile::tempdir().unwrap();

    let grading_job = job(assets_root.path(), &sandbox_bin, scratch_root.path());
    let nb = json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": { "assignment_id": "hw1" },
        "cells": [],
    });
    let bytes = serde_json::to_vec(&nb).unwrap();
    let report_bytes = grading_job.grade(&bytes).await;
    let report: Value = serde_json::from_slice(&report_bytes).unwrap();

    assert!(report["error"].as_str().unwrap().contains("submission_id"));
}

#[tokio::test]
async fn unknown_assignment_produces_id_carrying_error_report() {
    let assets_root = tempfile::tempdir().unwrap();
    let sandbox_dir = tempfile::tempdir().unwrap();
    let sandbox_bin = write_stub_sandbox(sandbox_dir.path());
    let scratch_root = tempfile::tempdir().unwrap();

    let grading_job = job(assets_root.path(), &sandbox_bin, scratch_root.path());
    let bytes = notebook_bytes("sub-missing-hw", "does-not-exist", "ex1", PASSING_SUBMISSION);
    let report_bytes = grading_job.grade(&bytes).await;
    let report: Value = serde_json::from_slice(&report_bytes).unwrap();

    assert_eq!(report["submission_id"], "sub-missing-hw");
    assert!(report["error"].as_str().unwrap().contains("assignment not found"));
}
