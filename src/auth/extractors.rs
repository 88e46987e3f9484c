//! Axum extractors for authentication.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use super::errors::{AuthError, AuthErrorKind};
use super::state::HasAuthBackend;

/// User identity attached to a request by the auth gate.
/// Carries only the id/name/email projection; the password hash is
/// never loaded on this path.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User UUID (the `userId` token claim)
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Extractor guarding protected routes.
///
/// Verifies the bearer access token, resolves the user identity, and
/// attaches it to the handler. Rejects with a uniform 401; the underlying
/// verification error is logged, never sent to the client.
pub struct AuthUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AuthError::new(AuthErrorKind::MissingBearer))?;

        let claims = state.jwt().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
            AuthError::new(AuthErrorKind::InvalidToken)
        })?;

        // A valid token can outlive its account; treat that as unauthorized.
        let profile = state
            .db()
            .users()
            .get_profile_by_uuid(&claims.user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to get user");
                AuthError::new(AuthErrorKind::DatabaseError)
            })?
            .ok_or_else(|| AuthError::new(AuthErrorKind::UserNotFound))?;

        Ok(AuthUser(CurrentUser {
            id: profile.uuid,
            name: profile.name,
            email: profile.email,
        }))
    }
}
