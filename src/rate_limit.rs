//! Rate limiting for authentication endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow brute force
//! attempts against register and login.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::net::SocketAddr;
use std::{num::NonZeroU32, sync::Arc};

/// Per-IP rate limiter for endpoint-specific limiting.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting configuration for authentication endpoints.
pub struct RateLimitConfig {
    /// Per-IP limiter for registration (10 per minute)
    pub register: Arc<IpLimiter>,
    /// Per-IP limiter for login attempts (30 per minute)
    pub login: Arc<IpLimiter>,
}

impl RateLimitConfig {
    const REGISTER_PER_MIN: u32 = 10;
    const LOGIN_PER_MIN: u32 = 30;

    pub fn new() -> Self {
        Self {
            register: Arc::new(RateLimiter::keyed(Quota::per_minute(
                NonZeroU32::new(Self::REGISTER_PER_MIN).unwrap(),
            ))),
            login: Arc::new(RateLimiter::keyed(Quota::per_minute(
                NonZeroU32::new(Self::LOGIN_PER_MIN).unwrap(),
            ))),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate limit key for a request: X-Forwarded-For (reverse proxy) first,
/// then the peer address. Requests with neither share one bucket.
fn client_key(request: &Request) -> String {
    if let Some(forwarded_for) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded_for.to_str() {
            if let Some(first_ip) = value.split(',').next() {
                let ip = first_ip.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn too_many_requests(message: &'static str) -> Response {
    (StatusCode::TOO_MANY_REQUESTS, message).into_response()
}

/// Middleware for rate limiting registration.
pub async fn rate_limit_register(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match config.register.check_key(&client_key(&request)) {
        Ok(_) => next.run(request).await,
        Err(_) => too_many_requests("Too many signup attempts. Please wait before trying again."),
    }
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match config.login.check_key(&client_key(&request)) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            too_many_requests("Too many authentication attempts. Please wait before trying again.")
        }
    }
}
