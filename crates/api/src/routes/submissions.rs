//! Route definitions for the `/submissions` resource.
//!
//! `/me` routes operate on the caller's own submission (created lazily on
//! first access); `/{id}` routes are for reviewers, plus the owning
//! partner where noted.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{chat, files, review, submission};
use crate::state::AppState;

/// Routes mounted at `/submissions`.
///
/// ```text
/// GET    /                          -> list_submissions (admin)
/// GET    /me                        -> my_submission
/// PUT    /me/steps/{step_id}        -> save_step
/// PUT    /me/current-step           -> set_current_step
/// PUT    /me/company-info           -> update_company_info
/// PUT    /me/compliance-info        -> update_compliance_info
/// PUT    /me/security-info          -> update_security_info
/// POST   /me/submit                 -> submit
/// POST   /me/reset                  -> reset
/// POST   /me/chat                   -> post_partner_message
/// POST   /me/files                  -> upload_file (multipart)
/// DELETE /me/files/{file_id}        -> delete_file
/// GET    /{id}                      -> get_submission (admin or owner)
/// GET    /{id}/progress             -> get_progress (admin or owner)
/// POST   /{id}/review               -> review_section (admin)
/// GET    /{id}/chat                 -> get_chat (admin or owner)
/// POST   /{id}/chat                 -> post_admin_message (admin)
/// PUT    /{id}/status               -> override_status (admin)
/// GET    /{id}/files/{file_id}/download -> download_file (admin or owner)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(submission::list_submissions))
        .route("/me", get(submission::my_submission))
        .route("/me/steps/{step_id}", put(submission::save_step))
        .route("/me/current-step", put(submission::set_current_step))
        .route("/me/company-info", put(submission::update_company_info))
        .route(
            "/me/compliance-info",
            put(submission::update_compliance_info),
        )
        .route("/me/security-info", put(submission::update_security_info))
        .route("/me/submit", post(submission::submit))
        .route("/me/reset", post(submission::reset))
        .route("/me/chat", post(chat::post_partner_message))
        .route("/me/files", post(files::upload_file))
        .route("/me/files/{file_id}", delete(files::delete_file))
        .route("/{id}", get(submission::get_submission))
        .route("/{id}/progress", get(submission::get_progress))
        .route("/{id}/review", post(review::review_section))
        .route(
            "/{id}/chat",
            get(chat::get_chat).post(chat::post_admin_message),
        )
        .route("/{id}/status", put(submission::override_status))
        .route(
            "/{id}/files/{file_id}/download",
            get(files::download_file),
        )
}
