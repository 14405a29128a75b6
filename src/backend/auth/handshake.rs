/**
 * Connection Authentication
 *
 * Resolves the credential a client presents into a `User`. Shared by the
 * HTTP auth middleware and the WebSocket upgrade, so both reject with the
 * same reasons.
 *
 * # Token Sources
 *
 * In priority order:
 * 1. Explicit auth field: `?token=` query parameter
 * 2. `Authorization: Bearer <token>` header
 * 3. Cookie named by `ACCESS_COOKIE_NAME` (default `access_token`)
 */

use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap,
};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use thiserror::Error;

use crate::backend::auth::sessions::verify_token;
use crate::backend::store::{BoardStore, StoreError};
use crate::shared::User;

/// Why a connection was refused
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication required")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Picks the token from the explicit field, then the bearer header, then the cookie
pub fn extract_token(
    explicit: Option<&str>,
    headers: &HeaderMap,
    cookie_name: &str,
) -> Option<String> {
    if let Some(token) = explicit.filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }

    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Verifies the token and loads its user
pub async fn authenticate(
    store: &dyn BoardStore,
    secret: &str,
    token: Option<String>,
) -> Result<User, AuthError> {
    let token = token.ok_or(AuthError::MissingToken)?;
    let claims = verify_token(secret, &token).map_err(|e| match e.kind() {
        JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;
    let user_id = claims.user_id().ok_or(AuthError::InvalidToken)?;

    match store.find_user(user_id).await? {
        Some(user) => Ok(user),
        None => {
            tracing::warn!(%user_id, "[Auth] Token for unknown user");
            Err(AuthError::UserNotFound)
        }
    }
}
