//! Background consumer of the report queue, used only in async mode
//! (spec.md §4.6 "Report listener"): the worker posts finished report
//! bytes, this task persists them to `<upload_dir>/<id>.txt` so `/report/
//! {id}` can serve them.

use std::path::PathBuf;
use std::sync::Arc;

use ag_queue::Queue;
use serde_json::Value;

use crate::objectstore::LogSink;

pub async fn run(queue: Arc<dyn Queue>, upload_dir: PathBuf, log_sink: Arc<dyn LogSink>) {
    loop {
        let bytes = match queue.receive(ag_queue::REPORT_CHANNEL).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "report queue closed, listener exiting");
                return;
            }
        };

        let submission_id = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|v| v.get("submission_id").and_then(Value::as_str).map(String::from));

        let Some(submission_id) = submission_id else {
            tracing::warn!("dropped a report with no submission_id");
            continue;
        };

        let dest = upload_dir.join(format!("{submission_id}.txt"));
        if let Err(e) = tokio::fs::write(&dest, &bytes).await {
            tracing::error!(error = %e, path = %dest.display(), "failed to persist report");
            continue;
        }
        log_sink.mirror(&format!("{submission_id}.txt"), &bytes).await;
    }
}
