pub mod admin;
pub mod auth;
pub mod health;
pub mod notification;
pub mod submissions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/setup                                first-run superadmin bootstrap (public)
/// /auth/login                                login (public)
/// /auth/refresh                              refresh (public)
/// /auth/logout                               logout (requires auth)
/// /auth/me                                   current user profile
///
/// /admin/users                               list, create (user managers)
/// /admin/users/{id}                          get, update, delete
/// /admin/users/{id}/permissions              replace stage permissions (PUT)
/// /admin/users/{id}/reset-password           reset password (POST)
/// /admin/metrics                             dashboard metrics
///
/// /submissions                               review queue (admin)
/// /submissions/me                            own submission, created lazily
/// /submissions/me/steps/{step_id}            save wizard step (PUT)
/// /submissions/me/current-step               move bookmark (PUT)
/// /submissions/me/company-info               section form (PUT)
/// /submissions/me/compliance-info            section form (PUT)
/// /submissions/me/security-info              section form (PUT)
/// /submissions/me/submit                     final submission (POST)
/// /submissions/me/reset                      wipe wizard answers (POST)
/// /submissions/me/chat                       partner reply (POST)
/// /submissions/me/files                      upload document (POST multipart)
/// /submissions/me/files/{file_id}            remove document (DELETE)
/// /submissions/{id}                          submission detail
/// /submissions/{id}/progress                 derived progress
/// /submissions/{id}/review                   review decision (POST, admin)
/// /submissions/{id}/chat                     threads (GET), admin comment (POST)
/// /submissions/{id}/status                   status override (PUT, admin)
/// /submissions/{id}/files/{file_id}/download document download
///
/// /notifications                             mailbox listing
/// /notifications/unread-count                unread badge count
/// /notifications/read-all                    mark all read (POST)
/// /notifications/{id}/read                   mark one read (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/submissions", submissions::router())
        .nest("/notifications", notification::router())
}
