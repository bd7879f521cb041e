//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /setup     -> setup (public, first run only)
/// POST   /login     -> login (public)
/// POST   /refresh   -> refresh (public)
/// POST   /logout    -> logout
/// GET    /me        -> me
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/setup", post(auth::setup))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}
