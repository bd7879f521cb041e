//! Route definitions for the `/admin` resource.
//!
//! All endpoints require an admin role; user management additionally
//! requires the `can_manage_users` grant, checked in the handlers.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /users                     -> list_users
/// POST   /users                     -> create_user
/// GET    /users/{id}                -> get_user
/// PUT    /users/{id}                -> update_user
/// DELETE /users/{id}                -> delete_user
/// PUT    /users/{id}/permissions    -> set_permissions
/// POST   /users/{id}/reset-password -> reset_password
/// GET    /metrics                   -> metrics
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
        .route("/users/{id}/permissions", put(admin::set_permissions))
        .route("/users/{id}/reset-password", post(admin::reset_password))
        .route("/metrics", get(admin::metrics))
}
