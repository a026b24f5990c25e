//! Best-effort mirroring of submission/report bytes to an object-store
//! bucket (spec.md §4.6, §7: "Object-store errors: logged and treated as
//! non-fatal when logging is enabled; grading proceeds"). The object store
//! itself is an external collaborator (spec.md §1) — this models it as a
//! plain HTTP PUT the way the teacher's `services::moss` module talks to
//! its external collaborator (MOSS) over a raw socket: a small struct, one
//! async method, errors turned into a `Result<_, String>` rather than a
//! typed error, since failures here are always just logged and swallowed.

use async_trait::async_trait;

#[async_trait]
pub trait LogSink: Send + Sync {
    async fn mirror(&self, key: &str, bytes: &[u8]);
}

/// Used when `LOG_BUCKET` is not configured.
pub struct NullLogSink;

#[async_trait]
impl LogSink for NullLogSink {
    async fn mirror(&self, _key: &str, _bytes: &[u8]) {}
}

/// PUTs `bytes` to `{bucket_url}/{key}`. Any failure is logged and
/// swallowed; callers never see it (spec.md §7).
pub struct HttpLogSink {
    bucket_url: String,
    client: reqwest::Client,
}

impl HttpLogSink {
    pub fn new(bucket_url: impl Into<String>) -> Self {
        HttpLogSink {
            bucket_url: bucket_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LogSink for HttpLogSink {
    async fn mirror(&self, key: &str, bytes: &[u8]) {
        let url = format!("{}/{}", self.bucket_url.trim_end_matches('/'), key);
        if let Err(e) = self.client.put(&url).body(bytes.to_vec()).send().await {
            tracing::warn!(error = %e, url = %url, "object-store mirror failed");
        }
    }
}
