//! `SessionUser` extractor: pulls the session cookie and turns it into "who
//! is calling", rejecting with 401 otherwise. Shaped like the teacher's
//! `api::auth::extractors` (a `FromRequestParts` impl reading a claims
//! struct out of the request, used by handlers that need the caller's
//! identity).

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::Key;
use axum_extra::extract::PrivateCookieJar;

use crate::error::ServerError;
use crate::session::{Session, SESSION_COOKIE_NAME};

/// The authenticated caller (spec.md §3 Session): just the salted hash,
/// nothing else is carried in the cookie.
pub struct SessionUser {
    pub hash: String,
}

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| ServerError::AuthRequired)?;

        let cookie = jar.get(SESSION_COOKIE_NAME).ok_or(ServerError::AuthRequired)?;
        let session = Session::from_cookie(&cookie).ok_or(ServerError::AuthRequired)?;

        if session.hash.is_empty() {
            return Err(ServerError::AuthRequired);
        }

        let now = chrono::Utc::now().timestamp();
        if session.is_expired(now) {
            return Err(ServerError::AuthRequired);
        }

        Ok(SessionUser { hash: session.hash })
    }
}
