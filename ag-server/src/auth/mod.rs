//! Authentication: OIDC login dance, session cookie, allow-list check
//! (spec.md §4.6). Grounded on the shape of the teacher's `api::auth`
//! module (an extractor for "who is calling" plus a guard for "are they
//! allowed"), generalized from bearer-JWT claims to an OIDC-backed cookie
//! session.

pub mod extractor;
pub mod handlers;
pub mod oidc;

pub use extractor::SessionUser;
pub use oidc::{OidcAuth, OidcError, PendingLogin};
