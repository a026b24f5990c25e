//! `GET /report/{submission_id}` (spec.md §4.6 Report retrieval).

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};
use serde_json::Value;
use uuid::Uuid;

use crate::html;
use crate::report_backoff::PollState;
use crate::state::AppState;

const TOP_LEVEL_KEYS: &[&str] = &["assignment_id", "submission_id", "user_hash", "timestamp", "error"];

pub async fn report(State(state): State<AppState>, Path(submission_id): Path<Uuid>) -> Response {
    let path = state.upload_dir.join(format!("{submission_id}.txt"));

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            state.report_backoff.clear(submission_id).await;
            Html(render_report(&submission_id.to_string(), &bytes)).into_response()
        }
        Err(_) => match state.report_backoff.poll(submission_id).await {
            PollState::Waiting(delay_ms) => {
                Html(html::render_polling_page(&submission_id.to_string(), delay_ms)).into_response()
            }
            PollState::TimedOut => Html(html::render_timeout_page(&submission_id.to_string())).into_response(),
        },
    }
}

fn render_report(submission_id: &str, bytes: &[u8]) -> String {
    let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(bytes) else {
        return html::render_report_page(submission_id, &[]);
    };

    let fragments: Vec<(String, String)> = map
        .into_iter()
        .filter(|(k, _)| !TOP_LEVEL_KEYS.contains(&k.as_str()))
        .map(|(exercise_id, value)| {
            let fragment = value
                .get("report")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            (exercise_id, fragment)
        })
        .collect();

    html::render_report_page(submission_id, &fragments)
}
