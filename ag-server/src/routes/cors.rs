//! Origin-mirroring CORS for `/upload` (spec.md §4.6: "Cross-origin
//! responses, when enabled, mirror the request `Origin`, allow credentials,
//! advertise `X-Report-Url` as exposed, and set `Access-Control-Allow-
//! Methods: POST` for preflight"). Hand-rolled middleware rather than
//! `tower_http::cors::CorsLayer`'s wildcard/static-list modes, since
//! mirroring the request's own `Origin` back verbatim isn't one of its
//! built-in policies.

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;

pub async fn mirror_origin_cors(request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .cloned();
    let is_preflight = request.method() == Method::OPTIONS;

    let mut response = next.run(request).await;

    if let Some(origin) = origin {
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static("X-Report-Url"),
        );
        if is_preflight {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("POST"),
            );
        }
    }

    response
}
