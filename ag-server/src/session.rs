//! Cookie-store session (spec.md §3 Session, §4.6 Authentication).
//!
//! **(supplement, SPEC_FULL.md §3)** records its own creation instant so
//! max-age is enforced independent of the cookie library's own expiry
//! handling — grounded on the teacher's `auth::claims::Claims { exp: usize,
//! .. }` pattern, generalized from a JWT expiry field to a plain
//! server-side timestamp since this session is an encrypted cookie value,
//! not a signed JWT.

use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE_NAME: &str = "session";
pub const SESSION_MAX_AGE_SECS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Salted hash of the authenticated user's email (spec.md §3 Session,
    /// `ag_common::hash::salted_sha224`).
    pub hash: String,
    pub created_at: i64,
}

impl Session {
    pub fn new(hash: String, now: i64) -> Self {
        Session { hash, created_at: now }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now - self.created_at > SESSION_MAX_AGE_SECS
    }

    pub fn to_cookie(&self, secure: bool) -> Cookie<'static> {
        let value = serde_json::to_string(self).expect("session serializes to JSON");
        Cookie::build((SESSION_COOKIE_NAME, value))
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(SESSION_MAX_AGE_SECS))
            .path("/")
            .build()
    }

    pub fn from_cookie(cookie: &Cookie<'_>) -> Option<Self> {
        serde_json::from_str(cookie.value()).ok()
    }
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// Derives a `cookie::Key` for `PrivateCookieJar` from the two env-sourced
/// secrets spec.md §6 names separately (`COOKIE_AUTH_KEY`,
/// `COOKIE_ENCRYPT_KEY`) by concatenating them and stretching the result
/// through `Key::derive_from` — the idiomatic `cookie` crate's single-key
/// model, bridged from the spec's two-key (HMAC key + block cipher key)
/// convention. Decision recorded in DESIGN.md.
pub fn derive_cookie_key(auth_key: Option<&str>, encrypt_key: Option<&str>) -> Key {
    let mut material = Vec::new();
    material.extend_from_slice(auth_key.unwrap_or("dev-cookie-auth-key").as_bytes());
    material.extend_from_slice(encrypt_key.unwrap_or("dev-cookie-encrypt-key").as_bytes());
    Key::derive_from(&material)
}
