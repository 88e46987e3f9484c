//! Tests for the bearer-token auth gate and the ideas routes.
//!
//! Tests cover:
//! - Public listing without credentials
//! - Gate rejections: missing header, wrong scheme, malformed token,
//!   expired token, token for a deleted user
//! - JSON 404 fallback for unmatched routes

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
};
use http_body_util::BodyExt;
use ideadrop::{
    ServerConfig, create_app,
    db::Database,
    jwt::{Clock, JwtConfig, TokenPolicy},
};
use std::sync::Arc;
use tower::ServiceExt;

const TEST_SECRET: &[u8] = b"test-jwt-secret-that-is-long-enough";

/// Fixed time source for issuing already-expired tokens.
struct FixedClock(u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

/// Create a test app and return (app, db, jwt_config).
async fn create_test_app() -> (axum::Router, Database, JwtConfig) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let jwt = JwtConfig::new(TEST_SECRET, TokenPolicy::default());
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: TEST_SECRET.to_vec(),
        token_policy: TokenPolicy::default(),
        cors_origin: None,
        secure_cookies: false,
    };
    (create_app(&config), db, jwt)
}

/// Insert a user directly and return (uuid, access_token).
async fn create_user_with_token(db: &Database, jwt: &JwtConfig, email: &str) -> (String, String) {
    let uuid = uuid::Uuid::new_v4().to_string();
    db.users()
        .create(&uuid, "Test User", email, "$hash$")
        .await
        .unwrap()
        .expect("email is free");
    let token = jwt.issue_access_token(&uuid).unwrap();
    (uuid, token)
}

async fn post_idea(app: &axum::Router, authorization: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/ideas")
        .header("content-type", "application/json");
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }

    app.clone()
        .oneshot(
            builder
                .body(Body::from(
                    serde_json::json!({ "title": "New idea", "description": "details" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Public listing
// =============================================================================

#[tokio::test]
async fn test_list_ideas_is_public() {
    let (app, _, _) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/ideas")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let ideas = body.as_array().expect("array of ideas");
    assert_eq!(ideas.len(), 3);
    assert_eq!(ideas[0]["title"], "Idea 1");
}

// =============================================================================
// Gate rejections
// =============================================================================

#[tokio::test]
async fn test_gate_rejects_missing_header() {
    let (app, _, _) = create_test_app().await;

    let response = post_idea(&app, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "Not authorized, token failed to verify"
    );
}

#[tokio::test]
async fn test_gate_rejects_non_bearer_scheme() {
    let (app, db, jwt) = create_test_app().await;
    let (_, token) = create_user_with_token(&db, &jwt, "a@x.com").await;

    let response = post_idea(&app, Some(&format!("Token {}", token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_gate_rejects_malformed_token() {
    let (app, _, _) = create_test_app().await;

    let response = post_idea(&app, Some("Bearer not-a-token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_gate_rejects_token_signed_with_other_secret() {
    let (app, db, jwt) = create_test_app().await;
    let (uuid, _) = create_user_with_token(&db, &jwt, "a@x.com").await;

    let other = JwtConfig::new(b"another-secret-that-is-long-enough", TokenPolicy::default());
    let token = other.issue_access_token(&uuid).unwrap();

    let response = post_idea(&app, Some(&format!("Bearer {}", token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_gate_rejects_expired_token() {
    let (app, db, jwt) = create_test_app().await;
    let (uuid, _) = create_user_with_token(&db, &jwt, "a@x.com").await;

    // Issued far enough in the past that its 60s lifetime has elapsed.
    let past_issuer = JwtConfig::with_clock(
        TEST_SECRET,
        TokenPolicy::default(),
        Arc::new(FixedClock(1_000_000)),
    );
    let expired = past_issuer.issue_access_token(&uuid).unwrap();

    let response = post_idea(&app, Some(&format!("Bearer {}", expired))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_gate_rejects_token_for_deleted_user() {
    let (app, db, jwt) = create_test_app().await;
    let (uuid, token) = create_user_with_token(&db, &jwt, "a@x.com").await;

    db.users().delete_by_uuid(&uuid).await.unwrap();

    let response = post_idea(&app, Some(&format!("Bearer {}", token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Authenticated access
// =============================================================================

#[tokio::test]
async fn test_gate_allows_valid_token() {
    let (app, db, jwt) = create_test_app().await;
    let (_, token) = create_user_with_token(&db, &jwt, "a@x.com").await;

    let response = post_idea(&app, Some(&format!("Bearer {}", token))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["title"], "New idea");
}

// =============================================================================
// Fallback
// =============================================================================

#[tokio::test]
async fn test_unmatched_route_returns_json_404() {
    let (app, _, _) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Not Found - /api/nope");
}
