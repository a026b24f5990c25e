//! Route handlers and router assembly (spec.md §4.6). Grounded on the
//! teacher's `api::routes` module: one file per concern, composed into a
//! single `Router` in `build_router`.

mod cors;
mod report;
mod upload;

pub use cors::mirror_origin_cors;

use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::favicon::FAVICON_ICO;
use crate::html;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let asset_root = state.asset_tree.root().to_path_buf();
    let upload_dir = state.upload_dir.clone();

    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload::upload).options(preflight))
        .route("/report/{submission_id}", get(report::report))
        .route("/login", get(crate::auth::handlers::login))
        .route("/callback", get(crate::auth::handlers::callback))
        .route("/logout", get(crate::auth::handlers::logout))
        .route("/profile", get(crate::auth::handlers::profile))
        .route("/favicon.ico", get(favicon))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .nest_service("/static", ServeDir::new(asset_root))
        .layer(axum::middleware::from_fn(cors::mirror_origin_cors))
        .with_state(state)
}

async fn index() -> Html<String> {
    Html(html::render_index())
}

/// CORS preflight for `/upload` (spec.md §4.6 "OPTIONS"); the actual
/// mirrored headers are added by `mirror_origin_cors` below.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn favicon() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/x-icon")],
        FAVICON_ICO,
    )
}

pub(crate) fn html_response(status: StatusCode, body: String) -> Response {
    (status, Html(body)).into_response()
}
