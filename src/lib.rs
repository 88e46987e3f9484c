pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;

use api::{ApiError, create_api_router};
use axum::{
    Router,
    http::{HeaderValue, Method, Uri, header},
};
use db::Database;
use jwt::{JwtConfig, TokenPolicy};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Access/refresh token lifetimes
    pub token_policy: TokenPolicy,
    /// Browser origin allowed to call the API with credentials.
    /// None disables CORS handling entirely (server-to-server only).
    pub cors_origin: Option<String>,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.jwt_secret, config.token_policy.clone()));

    let api_router = create_api_router(config.db.clone(), jwt, config.secure_cookies);

    let router = Router::new()
        .nest("/api", api_router)
        .fallback(not_found);

    match &config.cors_origin {
        Some(origin) => router.layer(cors_layer(origin)),
        None => router,
    }
}

/// Unmatched routes get a JSON 404 naming the path.
async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Not Found - {}", uri.path()))
}

/// CORS for browser clients: the configured frontend origin plus any
/// HTTPS Vercel preview deployment. Credentials are required so the
/// refresh cookie travels with cross-origin requests.
fn cors_layer(frontend_origin: &str) -> CorsLayer {
    let allowed = frontend_origin.to_string();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| {
                    o == allowed || (o.starts_with("https://") && o.ends_with(".vercel.app"))
                })
                .unwrap_or(false)
        }))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
