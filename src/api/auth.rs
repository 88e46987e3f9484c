//! Authentication API endpoints.
//!
//! - POST `/register` - Create an account and issue tokens
//! - POST `/login` - Authenticate and issue tokens
//! - POST `/logout` - Clear the refresh cookie
//! - POST `/refresh` - Exchange the refresh cookie for a new access token

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use super::error::{ApiError, ResultExt};
use crate::auth::{REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie};
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::password::{hash_password, verify_password};
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_register};

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Clone)]
pub struct AuthApiState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
}

impl_has_auth_backend!(AuthApiState);

pub fn router(state: AuthApiState, rate_limits: Arc<RateLimitConfig>) -> Router {
    let guarded = Router::new()
        .route(
            "/register",
            post(register).layer(middleware::from_fn_with_state(
                rate_limits.clone(),
                rate_limit_register,
            )),
        )
        .route(
            "/login",
            post(login).layer(middleware::from_fn_with_state(
                rate_limits,
                rate_limit_login,
            )),
        );

    Router::new()
        .merge(guarded)
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
        .with_state(state)
}

// Fields are optional so a missing field yields the contract's 400 body
// rather than a serde rejection.
#[derive(Deserialize)]
struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct UserBody {
    id: String,
    name: String,
    email: String,
}

#[derive(Serialize)]
struct AuthResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    user: UserBody,
}

fn non_blank(field: Option<&String>) -> Option<&str> {
    field.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Emails are compared case-insensitively; normalize once at the edge.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Issue both tokens and build the success response shared by register
/// and login: access token in the body, refresh token in an HTTP-only
/// cookie.
fn issue_session(
    state: &AuthApiState,
    status: StatusCode,
    user: UserBody,
) -> Result<Response, ApiError> {
    let access_token = state.jwt.issue_access_token(&user.id).map_err(|e| {
        error!("Failed to issue access token: {}", e);
        ApiError::internal("Failed to generate token")
    })?;
    let refresh_token = state.jwt.issue_refresh_token(&user.id).map_err(|e| {
        error!("Failed to issue refresh token: {}", e);
        ApiError::internal("Failed to generate token")
    })?;

    let cookie = refresh_cookie(
        &refresh_token,
        state.jwt.policy().refresh_ttl_secs,
        state.secure_cookies,
    );

    Ok((
        status,
        [(SET_COOKIE, cookie)],
        Json(AuthResponse {
            access_token,
            user,
        }),
    )
        .into_response())
}

async fn register(
    State(state): State<AuthApiState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(name), Some(email), Some(password)) = (
        non_blank(payload.name.as_ref()),
        non_blank(payload.email.as_ref()),
        payload.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("All fields are required"));
    };

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(
            "Password must be at least 6 characters",
        ));
    }

    let email = normalize_email(email);
    let password_hash = hash_password(password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to create user")
    })?;

    let uuid = uuid::Uuid::new_v4().to_string();

    // Single atomic insert; the unique email index decides duplicates.
    let created = state
        .db
        .users()
        .create(&uuid, name, &email, &password_hash)
        .await
        .db_err("Failed to create user")?;

    if created.is_none() {
        return Err(ApiError::bad_request("User already exists"));
    }

    issue_session(
        &state,
        StatusCode::CREATED,
        UserBody {
            id: uuid,
            name: name.to_string(),
            email,
        },
    )
}

async fn login(
    State(state): State<AuthApiState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (
        non_blank(payload.email.as_ref()),
        payload.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    // Unknown email and wrong password produce the identical error:
    // no oracle distinguishing the two.
    let invalid_credentials = || ApiError::bad_request("Invalid credentials");

    let user = state
        .db
        .users()
        .get_by_email(&normalize_email(email))
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(invalid_credentials)?;

    let matches = verify_password(password, &user.password_hash).map_err(|e| {
        error!("Failed to verify password: {}", e);
        ApiError::internal("Failed to verify credentials")
    })?;

    if !matches {
        return Err(invalid_credentials());
    }

    issue_session(
        &state,
        StatusCode::OK,
        UserBody {
            id: user.uuid,
            name: user.name,
            email: user.email,
        },
    )
}

/// Clear the refresh cookie. Always succeeds. The refresh token itself
/// stays valid until expiry: stateless tokens cannot be revoked
/// server-side, an accepted limitation of this design.
async fn logout(State(state): State<AuthApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(SET_COOKIE, clear_refresh_cookie(state.secure_cookies))],
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    )
}

/// Mint a new access token from the refresh cookie. The refresh token is
/// not rotated here.
async fn refresh(
    State(state): State<AuthApiState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .ok_or_else(|| ApiError::unauthorized("No refresh token found"))?;

    let claims = state.jwt.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Refresh token rejected");
        ApiError::unauthorized("Invalid or expired refresh token")
    })?;

    let profile = state
        .db
        .users()
        .get_profile_by_uuid(&claims.user_id)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    let access_token = state.jwt.issue_access_token(&profile.uuid).map_err(|e| {
        error!("Failed to issue access token: {}", e);
        ApiError::internal("Failed to generate token")
    })?;

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            access_token,
            user: UserBody {
                id: profile.uuid,
                name: profile.name,
                email: profile.email,
            },
        }),
    ))
}
