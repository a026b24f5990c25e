//! OpenID Connect login dance (spec.md §4.6, §6).
//!
//! **(supplement)**: the teacher's `api` crate only ever validates
//! first-party bearer JWTs (`auth::extractors`), so there is nothing to
//! generalize here — this is net-new, grounded on `openidconnect`, the
//! crate named explicitly in SPEC_FULL.md §4.6 for this addition.

use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::reqwest::async_http_client;
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce, OAuth2TokenResponse,
    RedirectUrl, Scope, TokenResponse,
};

#[derive(Debug, thiserror::Error)]
pub enum OidcError {
    #[error("OIDC discovery failed: {0}")]
    Discovery(String),
    #[error("token exchange failed: {0}")]
    Exchange(String),
    #[error("userinfo request failed: {0}")]
    UserInfo(String),
}

/// Wraps a discovered `CoreClient`, built once at startup.
pub struct OidcAuth {
    client: CoreClient,
}

pub struct PendingLogin {
    pub authorize_url: String,
    pub csrf_token: CsrfToken,
    pub nonce: Nonce,
}

impl OidcAuth {
    /// Performs OIDC discovery against `issuer_url` (spec.md §6: `CLIENT_ID`,
    /// `CLIENT_SECRET`).
    pub async fn discover(
        issuer_url: &str,
        client_id: &str,
        client_secret: &str,
        redirect_url: &str,
    ) -> Result<Self, OidcError> {
        let issuer = IssuerUrl::new(issuer_url.to_string()).map_err(|e| OidcError::Discovery(e.to_string()))?;
        let metadata = CoreProviderMetadata::discover_async(issuer, async_http_client)
            .await
            .map_err(|e| OidcError::Discovery(e.to_string()))?;

        let client = CoreClient::from_provider_metadata(
            metadata,
            ClientId::new(client_id.to_string()),
            Some(ClientSecret::new(client_secret.to_string())),
        )
        .set_redirect_uri(
            RedirectUrl::new(redirect_url.to_string()).map_err(|e| OidcError::Discovery(e.to_string()))?,
        );

        Ok(OidcAuth { client })
    }

    /// Starts the login dance: builds the provider's authorize URL
    /// (spec.md §4.6 `/login`).
    pub fn begin_login(&self) -> PendingLogin {
        let (authorize_url, csrf_token, nonce) = self
            .client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .url();

        PendingLogin {
            authorize_url: authorize_url.to_string(),
            csrf_token,
            nonce,
        }
    }

    /// Exchanges the authorization code for an ID token and extracts the
    /// verified email claim (spec.md §4.6 `/callback`: "exchanges the
    /// authorization code for a user-info document").
    pub async fn exchange_for_email(&self, code: String, nonce: &Nonce) -> Result<String, OidcError> {
        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(|e| OidcError::Exchange(e.to_string()))?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| OidcError::Exchange("provider did not return an id_token".to_string()))?;
        let claims = id_token
            .claims(&self.client.id_token_verifier(), nonce)
            .map_err(|e| OidcError::Exchange(e.to_string()))?;

        claims
            .email()
            .map(|e| e.as_str().to_string())
            .ok_or_else(|| OidcError::UserInfo("id token carried no email claim".to_string()))
    }
}
