//! Handler for the section review workflow.
//!
//! The decision itself is planned by the domain core as a single patch;
//! this handler only gathers the inputs (submission, actor profile, user
//! directory), applies the patch in one update, and fans out the mention
//! notifications afterwards. Notification delivery is best-effort: a
//! failure there is logged and never rolls back the review.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use onboard_core::conversation::KnownUser;
use onboard_core::error::CoreError;
use onboard_core::review::{plan_review, ReviewAction};
use onboard_core::section::Section;
use onboard_core::types::EntityId;
use onboard_db::models::submission::SubmissionResponse;
use onboard_db::repositories::{NotificationRepo, SubmissionRepo, UserRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// Stored section name, e.g. `"Company Information"`.
    pub section: String,
    /// `"approve"` or `"requestChanges"`.
    pub action: String,
    /// Optional reviewer comment; meaningful for `requestChanges`.
    pub comment: Option<String>,
}

/// POST /api/v1/submissions/{id}/review
pub async fn review_section(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<SubmissionResponse>> {
    let section = Section::parse(&input.section)?;
    let action = ReviewAction::parse(&input.action)?;

    let row = SubmissionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Submission",
            id,
        }))?;
    let submission = row.into_submission()?;

    let actor = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?
        .actor_profile();

    let directory: Vec<KnownUser> = UserRepo::directory(&state.pool)
        .await?
        .into_iter()
        .map(|u| KnownUser {
            id: u.id,
            email: u.email,
        })
        .collect();

    let patch = plan_review(
        &submission,
        section,
        action,
        &actor,
        input.comment.as_deref(),
        &directory,
        Utc::now(),
    )?;

    let applied = SubmissionRepo::apply_review(&state.pool, id, &patch).await?;
    if !applied {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Submission",
            id,
        }));
    }

    if let Err(e) = NotificationRepo::create_all(&state.pool, &patch.notifications).await {
        tracing::warn!(error = %e, submission_id = %id, "Mention notification delivery failed");
    }

    tracing::info!(
        submission_id = %id,
        section = %section,
        action = %input.action,
        reviewer = %actor.email,
        "Review decision applied"
    );

    let row = SubmissionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;
    Ok(Json(row.into_response()?))
}
