//! JWT authentication for API routes.
//!
//! Dual-token system: short-lived access tokens (1 min default) sent per
//! request as `Authorization: Bearer <token>`, and long-lived refresh
//! tokens (30 days default) delivered only via an HTTP-only cookie.

mod cookie;
mod errors;
mod extractors;
mod state;

pub use cookie::{REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie};
pub use errors::AuthError;
pub use extractors::{AuthUser, CurrentUser, bearer_token};
pub use state::HasAuthBackend;
