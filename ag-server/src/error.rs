//! Request-pipeline error kinds (spec.md §7), each mapping to the HTTP
//! status spec.md prescribes. Shaped like `marker::error::MarkerError`: one
//! variant per failure kind with a `#[error("...")]` message, but also
//! implementing `IntoResponse` since this crate is the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::html;
use crate::response::ErrorResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("no `notebook` file part in the multipart upload")]
    MissingUploadPart,

    #[error("upload exceeds the 1 MiB size limit")]
    UploadTooLarge,

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("failed to parse uploaded notebook as JSON: {0}")]
    InvalidNotebook(#[from] ag_notebook::NotebookError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("queue error: {0}")]
    Queue(#[from] ag_queue::QueueError),

    #[error("authentication required")]
    AuthRequired,

    #[error("user is not on the allow-list")]
    Forbidden,

    #[error("OIDC exchange failed: {0}")]
    Oidc(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");

        // spec.md §7: 401 carries "a convenience login-link body" and 403
        // carries "a helpful message and a logout link" — both HTML, not
        // the JSON envelope other failures use. Parse errors get the same
        // treatment: "surfaced to the client as an HTTP 500 with a
        // synthesized report containing an HTML error fragment".
        match self {
            ServerError::AuthRequired => {
                (StatusCode::UNAUTHORIZED, Html(html::render_login_required())).into_response()
            }
            ServerError::Forbidden => {
                (StatusCode::FORBIDDEN, Html(html::render_forbidden())).into_response()
            }
            ServerError::InvalidNotebook(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(html::render_error_fragment(&self.to_string())),
            )
                .into_response(),
            other => {
                let status = match &other {
                    ServerError::MissingUploadPart | ServerError::Multipart(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    // spec.md §8 testable property #7: uploads over the 1 MiB
                    // cap must yield an HTTP 5xx.
                    ServerError::UploadTooLarge
                    | ServerError::Io(_)
                    | ServerError::Queue(_)
                    | ServerError::Oidc(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    ServerError::AuthRequired
                    | ServerError::Forbidden
                    | ServerError::InvalidNotebook(_) => unreachable!(),
                };
                ErrorResponse(status, other.to_string()).into_response()
            }
        }
    }
}
