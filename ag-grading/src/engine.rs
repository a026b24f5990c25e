//! The grading engine (spec.md §4.5): for one submission, parse → locate
//! assignment directory → iterate exercises → build scratch workspace →
//! run unit tests → run inline tests → render exercise-level HTML →
//! aggregate outcomes → emit a structured report.
//!
//! Builder shape mirrors `MarkingJob::new().with_coverage(..)
//! .with_feedback(..)`.

use std::path::Path;
use std::process::Stdio;
use std::time::{SystemTime, UNIX_EPOCH};

use ag_assets::AssetTree;
use ag_notebook::Notebook;
use ag_sandbox::{ResourceProfile, SandboxInvoker, SandboxLimits};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::GradingConfig;
use crate::error::GradingError;
use crate::report::{ExerciseReportBuilder, ReportBuilder};
use crate::{inline_test, render, unit_test, workspace};

pub struct GradingJob {
    asset_tree: AssetTree,
    sandbox: SandboxInvoker,
    scratch_root: std::path::PathBuf,
    config: GradingConfig,
}

impl GradingJob {
    pub fn new(asset_tree: AssetTree, sandbox: SandboxInvoker, scratch_root: impl Into<std::path::PathBuf>) -> Self {
        GradingJob {
            asset_tree,
            sandbox,
            scratch_root: scratch_root.into(),
            config: GradingConfig::default(),
        }
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.config.cleanup = cleanup;
        self
    }

    pub fn with_include_logs(mut self, include_logs: bool) -> Self {
        self.config.include_logs = include_logs;
        self
    }

    pub fn with_scratch_collision(mut self, policy: crate::config::ScratchCollisionPolicy) -> Self {
        self.config.on_scratch_collision = policy;
        self
    }

    pub fn with_auto_remove_existing_scratch(mut self, auto_remove: bool) -> Self {
        self.config.auto_remove_existing_scratch = auto_remove;
        self
    }

    /// Grades one submission end to end, always returning *some* serialized
    /// JSON report rather than propagating an error out of the pipeline
    /// (spec.md §7: "the grading engine always attempts to produce some
    /// report, even if degraded").
    pub async fn grade(&self, submission_bytes: &[u8]) -> Vec<u8> {
        match self.try_grade(submission_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "grading failed");
                let id = e.submission_id().unwrap_or("unknown").to_string();
                crate::report::error_report(&id, &e.to_string())
            }
        }
    }

    async fn try_grade(&self, submission_bytes: &[u8]) -> Result<Vec<u8>, GradingError> {
        let notebook = Notebook::parse(submission_bytes)?;

        let submission_id = notebook
            .metadata
            .get("submission_id")
            .and_then(Value::as_str)
            .ok_or(GradingError::MissingSubmissionId)?
            .to_string();
        let assignment_id = notebook
            .metadata
            .get("assignment_id")
            .and_then(Value::as_str)
            .ok_or(GradingError::MissingAssignmentId)?
            .to_string();
        let user_hash = notebook
            .metadata
            .get("user_hash")
            .and_then(Value::as_str)
            .map(String::from);
        let requested_exercise_id = notebook
            .metadata
            .get("requested_exercise_id")
            .and_then(Value::as_str)
            .map(String::from);

        self.asset_tree
            .resolve_assignment(&assignment_id)
            .map_err(|source| GradingError::AssetTree {
                submission_id: submission_id.clone(),
                source,
            })?;

        let scratch_submission_dir =
            workspace::prepare_submission_scratch(&self.scratch_root, &submission_id, &self.config)?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;

        let mut report = ReportBuilder::new(
            assignment_id.clone(),
            submission_id.clone(),
            user_hash,
            timestamp,
        );

        let mut graded_any = false;
        for cell in &notebook.cells {
            let Some(exercise_id) = cell.exercise_id() else {
                continue;
            };
            if let Some(filter) = &requested_exercise_id {
                if filter != exercise_id {
                    continue;
                }
            }
            graded_any = true;
            let exercise_value = self
                .grade_exercise(
                    &submission_id,
                    &assignment_id,
                    exercise_id,
                    &cell.source,
                    &scratch_submission_dir,
                )
                .await?;
            report.add_exercise(exercise_id, exercise_value);
        }

        if !graded_any {
            report.set_error("no exercises found in submission".to_string());
        }

        if self.config.cleanup {
            let _ = tokio::fs::remove_dir_all(&scratch_submission_dir).await;
        }

        Ok(report.to_bytes())
    }

    async fn grade_exercise(
        &self,
        submission_id: &str,
        assignment_id: &str,
        exercise_id: &str,
        submission_text: &str,
        scratch_submission_dir: &Path,
    ) -> Result<Value, GradingError> {
        let exercise_source_dir = self.asset_tree.exercise_dir(assignment_id, exercise_id);

        let assets = match ag_assets::discover_exercise_assets(&exercise_source_dir) {
            Ok(assets) => assets,
            Err(_) => {
                return Ok(ExerciseReportBuilder::empty_submission_like_error(
                    exercise_id,
                    "no autograder assets found for this exercise",
                ));
            }
        };

        // Trivial-submission short-circuit (spec.md §4.5 step a).
        if let Some(empty_path) = &assets.empty_submission {
            if let Ok(empty_text) = std::fs::read_to_string(empty_path) {
                if empty_text == submission_text {
                    return Ok(ExerciseReportBuilder::empty_submission(exercise_id));
                }
            }
        }

        let scratch_exercise_dir = scratch_submission_dir.join(exercise_id);
        workspace::copy_exercise_files(submission_id, &exercise_source_dir, &scratch_exercise_dir)?;
        workspace::write_submission_files(submission_id, &scratch_exercise_dir, submission_text)?;
        workspace::synthesize_inline_tests(submission_id, &assets, &scratch_exercise_dir, submission_text)?;

        let mut builder = ExerciseReportBuilder::new();
        let to_sandbox_err = |source: ag_sandbox::SandboxError| GradingError::Sandbox {
            submission_id: submission_id.to_string(),
            source,
        };

        let unit_limits = SandboxLimits::for_profile(ResourceProfile::UnitTest);
        for class_name in assets.unit_tests.keys() {
            let cmd = unit_test::unit_test_command(class_name);
            let out = self
                .sandbox
                .run_sandboxed(&scratch_exercise_dir, &unit_limits, &cmd)
                .await
                .map_err(to_sandbox_err)?;
            let (passed, methods) = unit_test::classify_unit_test_output(&out.combined, out.exit_code);
            builder.add_unit_test(class_name, passed, methods, &out.combined);
        }

        let inline_limits = SandboxLimits::for_profile(ResourceProfile::InlineTest);
        for name in assets.inline_tests.keys() {
            let file_name = format!("{name}_inlinetest.py");
            let cmd = inline_test::inline_test_command(&file_name);
            let out = self
                .sandbox
                .run_sandboxed(&scratch_exercise_dir, &inline_limits, &cmd)
                .await
                .map_err(to_sandbox_err)?;
            let (passed, error) = inline_test::classify_inline_test_output(&out.combined);
            let log_for_fragment = self.config.include_logs.then(|| out.combined.as_str());
            let fragment = render::render_inline_fragment(
                name,
                passed,
                error.as_deref(),
                submission_text,
                log_for_fragment,
            );
            builder.add_inline_test(name, passed, error, &out.combined, &fragment);
        }

        let mut template_fragments = Vec::new();
        for template_path in assets.templates.values() {
            match run_template(template_path, &builder.outcome_for_template(), submission_text).await {
                Ok(html) => template_fragments.push(html),
                Err(e) => tracing::warn!(error = %e, template = %template_path.display(), "report template script failed"),
            }
        }

        Ok(builder.finish(template_fragments))
    }
}

/// Runs a `<Name>_template.py` wrapper script (not a student submission, so
/// it is not sandboxed): feeds it the merged outcome JSON on stdin and
/// collects its rendered HTML from stdout (spec.md §4.2 table `%%template`
/// row, §4.5 step f).
async fn run_template(template_path: &Path, outcome: &Value, submission_text: &str) -> std::io::Result<String> {
    let mut payload = outcome.clone();
    if let Value::Object(ref mut map) = payload {
        map.insert(
            "submission_source".to_string(),
            Value::String(submission_text.to_string()),
        );
    }

    let mut child = Command::new("python3")
        .arg(template_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        let bytes = serde_json::to_vec(&payload).unwrap_or_default();
        stdin.write_all(&bytes).await?;
    }

    let output = child.wait_with_output().await?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
