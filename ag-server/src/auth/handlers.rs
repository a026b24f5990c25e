//! `/login`, `/callback`, `/logout`, `/profile` handlers (spec.md §4.6
//! Authentication).

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;
use openidconnect::Nonce;
use serde::Deserialize;

use ag_common::hash::salted_sha224;
use ag_common::Config;

use crate::error::ServerError;
use crate::html;
use crate::session::{removal_cookie, Session};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CallbackParams {
    code: String,
    state: String,
}

/// Redirects to the provider's authorize URL, stashing the CSRF token's
/// matching nonce so `/callback` can verify the id token (spec.md §4.6
/// "/login").
pub async fn login(State(state): State<AppState>) -> Result<Response, ServerError> {
    let oidc = state.oidc.as_ref().ok_or_else(|| {
        ServerError::Oidc("authentication is not configured (CLIENT_ID/CLIENT_SECRET unset)".into())
    })?;

    let pending = oidc.begin_login();
    state
        .pending_logins
        .write()
        .await
        .insert(pending.csrf_token.secret().clone(), pending.nonce);

    Ok(Redirect::to(&pending.authorize_url).into_response())
}

/// Exchanges the authorization code for an id token, salts-and-hashes the
/// verified email, and rejects callers not on the allow-list (spec.md
/// §4.6 "/callback").
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    jar: PrivateCookieJar,
) -> Result<Response, ServerError> {
    let oidc = state.oidc.as_ref().ok_or_else(|| {
        ServerError::Oidc("authentication is not configured (CLIENT_ID/CLIENT_SECRET unset)".into())
    })?;

    let nonce: Nonce = state
        .pending_logins
        .write()
        .await
        .remove(&params.state)
        .ok_or_else(|| ServerError::Oidc("unknown or expired login attempt".into()))?;

    let email = oidc
        .exchange_for_email(params.code, &nonce)
        .await
        .map_err(|e| ServerError::Oidc(e.to_string()))?;

    let config = Config::get();
    let hash = salted_sha224(&email.to_lowercase(), &config.hash_salt);

    if !state.allowed_emails.is_empty() && !state.allowed_emails.contains(&email.to_lowercase()) {
        let cleared = jar.remove(removal_cookie());
        return Ok((cleared, Html(html::render_forbidden())).into_response());
    }

    let now = chrono::Utc::now().timestamp();
    let session = Session::new(hash, now);
    let jar = jar.add(session.to_cookie(state.cookie_secure));

    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn logout(jar: PrivateCookieJar) -> Response {
    let jar = jar.remove(removal_cookie());
    (jar, Redirect::to("/")).into_response()
}

/// Returns the caller's pseudonymous identity (spec.md §3 Session).
pub async fn profile(user: crate::auth::SessionUser) -> Response {
    Html(format!("<p>Signed in as <code>{}</code></p>", user.hash)).into_response()
}
