use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use crate::{auth::jwt::TokenService, error::ApiError};

pub const MISSING_HEADER: &str = "Authorization header required";
pub const INVALID_FORMAT: &str = "Invalid authorization format";
pub const INVALID_TOKEN: &str = "Invalid or expired token";

/// Identity resolved from a validated bearer token.
///
/// Handlers that take this extractor never run for a rejected request, and
/// it is the only source of the caller's identity for owned-resource access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let tokens = Arc::<TokenService>::from_ref(state);

        match tokens.validate(token) {
            Ok(user_id) => Ok(AuthUser(user_id)),
            Err(e) => {
                warn!(reason = %e, "token rejected");
                Err(ApiError::Unauthorized(INVALID_TOKEN))
            }
        }
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`. The scheme is case-sensitive.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::Unauthorized(MISSING_HEADER))?;

    let value = raw
        .to_str()
        .map_err(|_| ApiError::Unauthorized(INVALID_FORMAT))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::Unauthorized(INVALID_FORMAT)),
    }
}
