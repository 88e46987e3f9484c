//! Idea listing API endpoints.
//!
//! - GET `/` - Public list of ideas
//! - POST `/` - Submit an idea (requires a verified identity)

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct IdeasState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(IdeasState);

pub fn router(state: IdeasState) -> Router {
    Router::new()
        .route("/", get(list_ideas).post(create_idea))
        .with_state(state)
}

#[derive(Serialize)]
struct Idea {
    id: u32,
    title: &'static str,
    description: &'static str,
}

/// Public idea listing.
async fn list_ideas() -> impl IntoResponse {
    let ideas = [
        Idea {
            id: 1,
            title: "Idea 1",
            description: "This is the first idea",
        },
        Idea {
            id: 2,
            title: "Idea 2",
            description: "This is the second idea",
        },
        Idea {
            id: 3,
            title: "Idea 3",
            description: "This is the third idea",
        },
    ];
    Json(ideas)
}

/// Echo the submitted idea back to an authenticated caller.
async fn create_idea(
    AuthUser(user): AuthUser,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    tracing::debug!(user = %user.id, "Idea submitted");
    (StatusCode::CREATED, Json(payload))
}
