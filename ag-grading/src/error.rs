use thiserror::Error;

/// Errors surfaced by the grading engine. Every variant that can occur once
/// a submission id is known carries it, so the caller can still reply with
/// a targeted, id-carrying error report (spec.md §4.5 step 1, §7).
#[derive(Debug, Error)]
pub enum GradingError {
    #[error("failed to parse submission notebook JSON: {0}")]
    InvalidNotebook(#[from] ag_notebook::NotebookError),

    #[error("submission notebook metadata is missing `submission_id`")]
    MissingSubmissionId,

    #[error("submission notebook metadata is missing `assignment_id`")]
    MissingAssignmentId,

    #[error("[{submission_id}] assignment not found: {source}")]
    AssetTree {
        submission_id: String,
        #[source]
        source: ag_assets::AssetError,
    },

    #[error("[{submission_id}] scratch directory already exists and collision policy is Reject: {path}")]
    ScratchCollision {
        submission_id: String,
        path: String,
    },

    #[error("[{submission_id}] io error: {source}")]
    Io {
        submission_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[{submission_id}] sandbox execution error: {source}")]
    Sandbox {
        submission_id: String,
        #[source]
        source: ag_sandbox::SandboxError,
    },
}

impl GradingError {
    /// The submission id this error carries, if any (spec.md §4.5 step 1:
    /// "surfaces an error carrying the submission id so the caller can
    /// still reply with a targeted report").
    pub fn submission_id(&self) -> Option<&str> {
        match self {
            GradingError::AssetTree { submission_id, .. }
            | GradingError::ScratchCollision { submission_id, .. }
            | GradingError::Io { submission_id, .. }
            | GradingError::Sandbox { submission_id, .. } => Some(submission_id),
            _ => None,
        }
    }
}
