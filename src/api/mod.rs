mod auth;
mod error;
mod ideas;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

pub use error::ApiError;

/// Create the API router.
pub fn create_api_router(db: Database, jwt: Arc<JwtConfig>, secure_cookies: bool) -> Router {
    let rate_limits = Arc::new(RateLimitConfig::new());

    let auth_state = auth::AuthApiState {
        db: db.clone(),
        jwt: jwt.clone(),
        secure_cookies,
    };

    let ideas_state = ideas::IdeasState { db, jwt };

    Router::new()
        .nest("/auth", auth::router(auth_state, rate_limits))
        .nest("/ideas", ideas::router(ideas_state))
}
