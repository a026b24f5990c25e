//! `POST /upload` (spec.md §4.6 Upload processing, §6 Upload).

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use ag_notebook::Notebook;

use crate::error::ServerError;
use crate::html;
use crate::state::{AppState, GradingMode};

const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

pub async fn upload(
    State(state): State<AppState>,
    auth: Option<crate::auth::SessionUser>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ServerError> {
    if ag_common::Config::get().auth_enabled() && auth.is_none() {
        return Err(ServerError::AuthRequired);
    }

    let mut bytes = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("notebook") {
            bytes = Some(field.bytes().await?);
            break;
        }
    }
    let bytes = bytes.ok_or(ServerError::MissingUploadPart)?;
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ServerError::UploadTooLarge);
    }

    let submission_id = Uuid::new_v4();
    let mut notebook = Notebook::parse(&bytes)?;

    let user_hash = auth.map(|u| u.hash).unwrap_or_default();
    notebook
        .metadata
        .insert("submission_id".to_string(), Value::String(submission_id.to_string()));
    notebook
        .metadata
        .insert("user_hash".to_string(), Value::String(user_hash));
    notebook
        .metadata
        .insert("timestamp".to_string(), Value::String(Utc::now().to_rfc3339()));

    let mutated = notebook.emit();

    let dest = state.upload_dir.join(format!("{submission_id}.ipynb"));
    write_private(&dest, &mutated).await?;

    state.log_sink.mirror(&format!("{submission_id}.ipynb"), &mutated).await;

    match &state.grading_mode {
        GradingMode::Combined(job) => {
            let report = job.grade(&mutated).await;
            let report_dest = state.upload_dir.join(format!("{submission_id}.txt"));
            tokio::fs::write(&report_dest, &report).await?;
            state.log_sink.mirror(&format!("{submission_id}.txt"), &report).await;
        }
        GradingMode::Async(queue) => {
            if let Err(e) = queue.post(ag_queue::AUTOGRADE_CHANNEL, mutated).await {
                tracing::error!(error = %e, "failed to enqueue submission for grading");
            }
        }
    }

    let report_url = format!("/report/{submission_id}");
    let wants_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"));

    let mut response = if wants_html {
        (StatusCode::OK, Html(html::render_upload_result(&report_url))).into_response()
    } else {
        let mut r = (StatusCode::OK, report_url.clone()).into_response();
        r.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        r
    };
    response.headers_mut().insert(
        "X-Report-Url",
        HeaderValue::from_str(&report_url).expect("uuid-derived url is valid header value"),
    );
    Ok(response)
}

async fn write_private(path: &std::path::Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    use tokio::fs::OpenOptions;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o700);

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    Ok(())
}
