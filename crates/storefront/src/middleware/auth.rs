//! Authentication extractor.
//!
//! Identity lives with the external provider and arrives as a bearer token;
//! this extractor is the single place a request's credential is resolved, so
//! handlers never subscribe to auth state on their own.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use crate::error::AppError;
use crate::state::AppState;
use crate::supabase::AuthenticatedUser;

/// Extractor that requires a verified bearer credential.
///
/// Missing or malformed headers and rejected tokens map to 401; provider
/// outages map to 500.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     Identity(user): Identity,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct Identity(pub AuthenticatedUser);

/// Pull the token out of an `Authorization: Bearer ...` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            AppError::Unauthenticated("Missing or invalid authorization header".to_owned())
        })?;

        let user = state
            .supabase()
            .verify_access_token(token)
            .await
            .map_err(AppError::from_identity)?;

        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().expect("header"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, "Basic abc123".parse().expect("header"));
        assert!(bearer_token(&headers).is_none());
    }
}
