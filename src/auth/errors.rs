//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Why authentication failed. Internal only: every kind except
/// `DatabaseError` collapses to the same 401 on the wire, so clients
/// cannot distinguish a bad signature from an expired token or a
/// deleted account.
#[derive(Debug)]
pub enum AuthErrorKind {
    MissingBearer,
    InvalidToken,
    UserNotFound,
    DatabaseError,
}

/// The single unauthorized result shared by every auth rejection site.
#[derive(Debug)]
pub struct AuthError {
    kind: AuthErrorKind,
}

impl AuthError {
    pub(super) fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    fn status_code(&self) -> StatusCode {
        match self.kind {
            AuthErrorKind::MissingBearer
            | AuthErrorKind::InvalidToken
            | AuthErrorKind::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthErrorKind::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::MissingBearer
            | AuthErrorKind::InvalidToken
            | AuthErrorKind::UserNotFound => "Not authorized, token failed to verify",
            AuthErrorKind::DatabaseError => "Database error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
