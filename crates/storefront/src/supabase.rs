//! Identity provider client (Supabase/GoTrue-compatible auth API).
//!
//! The storefront never mints credentials itself. The browser obtains a
//! bearer access token and a refresh token from the provider; this client
//! verifies access tokens (`GET /auth/v1/user`) and exchanges refresh tokens
//! (`POST /auth/v1/token?grant_type=refresh_token`).

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use libaas_core::{Email, SubjectId};

use crate::config::SupabaseConfig;

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The access token was valid once but has expired.
    #[error("access token expired")]
    TokenExpired,

    /// The credential is malformed, revoked, or otherwise not acceptable.
    #[error("invalid credentials: {0}")]
    InvalidToken(String),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with something this client cannot interpret.
    #[error("unexpected identity provider response: {0}")]
    Unexpected(String),
}

impl IdentityError {
    /// Whether this is a credential problem (as opposed to a transport or
    /// protocol failure). Credential problems map to 401; the rest do not.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::TokenExpired | Self::InvalidToken(_))
    }
}

/// The verified identity behind a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Provider subject id (stored as `supabaseId` in the content store).
    pub subject: SubjectId,
    /// Email the provider has on file.
    pub email: Email,
}

/// A full provider session: tokens plus the user they belong to.
#[derive(Debug, Clone)]
pub struct IdentitySession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthenticatedUser,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(alias = "error_description", alias = "message")]
    msg: Option<String>,
}

/// Client for the identity provider's auth API.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Create a new identity provider client.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            inner: Arc::new(SupabaseClientInner {
                http: reqwest::Client::new(),
                base_url: config.url.trim_end_matches('/').to_owned(),
                anon_key: config.anon_key.expose_secret().to_string(),
            }),
        }
    }

    /// Verify an access token and return the identity it belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::TokenExpired`] or
    /// [`IdentityError::InvalidToken`] when the provider rejects the token,
    /// and transport/protocol errors otherwise.
    pub async fn verify_access_token(
        &self,
        access_token: &str,
    ) -> Result<AuthenticatedUser, IdentityError> {
        let url = format!("{}/auth/v1/user", self.inner.base_url);

        let response = self
            .inner
            .http
            .get(&url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(rejection_error(response).await);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Unexpected(format!(
                "user endpoint returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let user: UserResponse = response.json().await?;
        authenticated_user(user)
    }

    /// Exchange a refresh token for a fresh session.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidToken`] when the refresh token is
    /// rejected, and transport/protocol errors otherwise.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<IdentitySession, IdentityError> {
        let url = format!(
            "{}/auth/v1/token?grant_type=refresh_token",
            self.inner.base_url
        );

        let response = self
            .inner
            .http
            .post(&url)
            .header("apikey", &self.inner.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            return Err(rejection_error(response).await);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Unexpected(format!(
                "token endpoint returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let token: TokenResponse = response.json().await?;
        let user = authenticated_user(token.user)?;

        Ok(IdentitySession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user,
        })
    }
}

/// Classify a 4xx rejection: expired tokens get their own variant so the
/// single silent-refresh retry knows when to kick in.
async fn rejection_error(response: reqwest::Response) -> IdentityError {
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.msg.unwrap_or_else(|| "token rejected".to_owned()),
        Err(_) => "token rejected".to_owned(),
    };

    if message.to_lowercase().contains("expired") {
        IdentityError::TokenExpired
    } else {
        IdentityError::InvalidToken(message)
    }
}

fn authenticated_user(user: UserResponse) -> Result<AuthenticatedUser, IdentityError> {
    let raw_email = user
        .email
        .ok_or_else(|| IdentityError::Unexpected("user record has no email".to_owned()))?;
    let email = Email::parse(&raw_email)
        .map_err(|e| IdentityError::Unexpected(format!("user email is invalid: {e}")))?;

    Ok(AuthenticatedUser {
        subject: SubjectId::new(user.id),
        email,
    })
}
