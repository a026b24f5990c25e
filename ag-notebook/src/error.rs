use thiserror::Error;

/// Failures surfaced while parsing or emitting a notebook.
///
/// One variant per failure kind, mirroring `marker::error::MarkerError`'s
/// shape rather than returning bare `String`s.
#[derive(Debug, Error)]
pub enum NotebookError {
    #[error("failed to parse notebook JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("cell {index} has a `source` field that is neither a string nor an array of strings")]
    InvalidSource { index: usize },
}
