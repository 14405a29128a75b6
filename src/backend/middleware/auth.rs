/**
 * Authentication Middleware
 *
 * Protects the `/api` routes. The token comes from `Authorization: Bearer`
 * or the access cookie, is verified with the same handshake the WebSocket
 * endpoint uses, and the resolved `User` is attached to the request
 * extensions for handlers to pick up through `AuthUser`.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::backend::auth::{authenticate, extract_token};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::User;

/// Authenticated caller of a request
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

/// Rejects with 401 and a JSON reason when no valid token is presented
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = extract_token(None, request.headers(), &state.config.access_cookie_name);
    let path = request.uri().path().to_string();
    let user = authenticate(state.store.as_ref(), &state.config.jwt_secret, token)
        .await
        .map_err(|e| {
            tracing::warn!(reason = %e, %path, "[Auth] Request rejected");
            BackendError::from(e)
        })?;

    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            tracing::warn!("[Auth] AuthUser not found in request extensions");
            BackendError::unauthorized("authentication required")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_extractor_reads_extension() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            avatar_url: None,
        };
        let mut request = HttpRequest::builder().uri("/api/boards").body(()).unwrap();
        request.extensions_mut().insert(AuthUser(user.clone()));
        let (mut parts, _) = request.into_parts();

        let AuthUser(extracted) = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, user);
    }

    #[tokio::test]
    async fn test_extractor_rejects_without_extension() {
        let request = HttpRequest::builder().uri("/api/boards").body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
