//! HTTP request-pipeline binary (spec.md §4.6, §2): upload → persist →
//! grade-inline-or-dispatch → poll-for-report, plus the OIDC login dance.
//!
//! Wired the way the teacher's `api::main` wires `ApiConfig` + `logger` +
//! `axum::serve`, generalized for this system's env surface (spec.md §6).

mod auth;
mod error;
mod favicon;
mod html;
mod listener;
mod objectstore;
mod report_backoff;
mod response;
mod routes;
mod session;
mod state;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::RwLock;

use ag_assets::AssetTree;
use ag_common::{Config, GradingMode as ConfigGradingMode};
use ag_grading::GradingJob;
use ag_queue::{InMemoryQueue, Queue};
use ag_sandbox::SandboxInvoker;

use auth::OidcAuth;
use objectstore::{HttpLogSink, LogSink, NullLogSink};
use report_backoff::ReportBackoff;
use session::derive_cookie_key;
use state::{AppState, GradingMode};

#[tokio::main]
async fn main() {
    Config::init(".env");
    let config = Config::get();
    ag_common::logger::init_logger(&config.log_level);

    tracing::info!(project = %config.project_name, mode = ?config.grading_mode, "starting server");

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("failed to create upload directory");

    let asset_tree = Arc::new(AssetTree::new(&config.asset_root));

    let log_sink: Arc<dyn LogSink> = match &config.log_bucket {
        Some(bucket) => Arc::new(HttpLogSink::new(bucket.clone())),
        None => Arc::new(NullLogSink),
    };

    let grading_mode = match config.grading_mode {
        ConfigGradingMode::Combined => {
            let sandbox = SandboxInvoker::new(&config.sandbox_binary);
            let job = GradingJob::new((*asset_tree).clone(), sandbox, &config.scratch_root)
                .with_cleanup(!config.disable_cleanup)
                .with_include_logs(config.include_logs)
                .with_scratch_collision(ag_grading::ScratchCollisionPolicy::from_env());
            GradingMode::Combined(Arc::new(job))
        }
        ConfigGradingMode::Async => {
            let queue: Arc<dyn Queue> = match &config.queue_url {
                Some(url) => {
                    let url = url.clone();
                    Arc::new(
                        ag_queue::open_with_backoff(move || {
                            let url = url.clone();
                            async move { ag_queue::RedisQueue::connect(&url).await }
                        })
                        .await,
                    )
                }
                None => {
                    tracing::warn!(
                        "QUEUE_URL unset in async mode; falling back to an in-process queue \
                         (the separate ag-worker binary must share this process to see it)"
                    );
                    Arc::new(InMemoryQueue::new())
                }
            };

            tokio::spawn(listener::run(queue.clone(), config.upload_dir.clone().into(), log_sink.clone()));
            GradingMode::Async(queue)
        }
    };

    let oidc = if config.auth_enabled() {
        let issuer = config
            .oidc_issuer_url
            .as_deref()
            .expect("auth_enabled implies CLIENT_ID/CLIENT_SECRET are set; OIDC_ISSUER_URL is also required");
        let redirect_url = format!("{}/callback", config.server_url.trim_end_matches('/'));
        match OidcAuth::discover(
            issuer,
            config.client_id.as_deref().unwrap(),
            config.client_secret.as_deref().unwrap(),
            &redirect_url,
        )
        .await
        {
            Ok(auth) => Some(Arc::new(auth)),
            Err(e) => {
                tracing::error!(error = %e, "OIDC discovery failed; authentication disabled for this process");
                None
            }
        }
    } else {
        None
    };

    let cookie_secure = config.server_url.starts_with("https://");

    let state = AppState {
        asset_tree,
        grading_mode,
        upload_dir: config.upload_dir.clone().into(),
        cookie_key: derive_cookie_key(config.cookie_auth_key.as_deref(), config.cookie_encrypt_key.as_deref()),
        report_backoff: Arc::new(ReportBackoff::new()),
        log_sink,
        oidc,
        allowed_emails: Arc::new(config.allowed_emails.clone()),
        cookie_secure,
        pending_logins: Arc::new(RwLock::new(HashMap::new())),
    };

    let app = routes::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.expect("failed to bind listen address");
    tracing::info!(%addr, "{} listening", config.project_name);

    axum::serve(listener, app).await.expect("server exited unexpectedly");
}
