//! Handlers for the submission lifecycle: lazy creation, section form
//! updates, wizard steps, progress, final submission and reset.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use onboard_core::error::CoreError;
use onboard_core::progress;
use onboard_core::roles::is_admin_role;
use onboard_core::submission::{timeline_icons, SubmissionStatus, TimelineEvent};
use onboard_core::types::EntityId;
use onboard_db::models::submission::{
    CompanyInfoUpdate, ComplianceUpdate, SecurityUpdate, SubmissionResponse, SubmissionRow,
};
use onboard_db::repositories::{SubmissionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CurrentStepRequest {
    pub step_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusOverrideRequest {
    pub status: String,
}

/// Combined progress payload: fixed-section document progress plus the
/// dynamic wizard view.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub sections: Vec<progress::SectionProgress>,
    pub resume_route: &'static str,
    pub wizard: progress::StepProgress,
}

/// Fetch the caller's submission, creating it on first access.
pub(crate) async fn own_submission(
    state: &AppState,
    auth: &AuthUser,
) -> AppResult<SubmissionRow> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;
    Ok(SubmissionRepo::get_or_create(&state.pool, &user).await?)
}

/// Load a submission by id, allowing the owning partner or any admin role.
pub(crate) async fn load_for_viewer(
    state: &AppState,
    auth: &AuthUser,
    id: EntityId,
) -> AppResult<SubmissionRow> {
    let row = SubmissionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Submission",
            id,
        }))?;
    if row.partner_id != auth.user_id && !is_admin_role(&auth.role) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not permitted to access this submission".into(),
        )));
    }
    Ok(row)
}

fn response(row: SubmissionRow) -> AppResult<Json<SubmissionResponse>> {
    Ok(Json(row.into_response()?))
}

/// Re-read a submission after a write so the response reflects the stored
/// state, JSONB appends included.
async fn refetch(state: &AppState, id: EntityId) -> AppResult<SubmissionRow> {
    SubmissionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Database(sqlx::Error::RowNotFound))
}

fn partner_event(row: &SubmissionRow, title: &str, content: &str) -> TimelineEvent {
    TimelineEvent {
        icon: timeline_icons::SUBMITTED.to_string(),
        title: title.to_string(),
        actor: row.partner_name.clone(),
        date: Utc::now(),
        content: content.to_string(),
        category: None,
    }
}

/// GET /api/v1/submissions
pub async fn list_submissions(
    RequireAdmin(_auth): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<SubmissionResponse>>> {
    let rows = SubmissionRepo::list(&state.pool).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(row.into_response()?);
    }
    Ok(Json(out))
}

/// GET /api/v1/submissions/me
pub async fn my_submission(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<SubmissionResponse>> {
    let row = own_submission(&state, &auth).await?;
    response(row)
}

/// GET /api/v1/submissions/{id}
pub async fn get_submission(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<Json<SubmissionResponse>> {
    let row = load_for_viewer(&state, &auth, id).await?;
    response(row)
}

/// GET /api/v1/submissions/{id}/progress
///
/// Progress is always recomputed from current state, never stored.
pub async fn get_progress(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<Json<ProgressResponse>> {
    let row = load_for_viewer(&state, &auth, id).await?;
    let submission = row.into_submission()?;
    Ok(Json(ProgressResponse {
        sections: progress::per_section_counts(&submission),
        resume_route: progress::resume_route(&submission),
        wizard: progress::step_progress(&submission),
    }))
}

/// PUT /api/v1/submissions/me/steps/{step_id}
///
/// Store one wizard step's answers. The payload must be a JSON object;
/// saving moves the navigation bookmark onto the step.
pub async fn save_step(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(step_id): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> AppResult<Json<SubmissionResponse>> {
    if progress::find_step(&step_id).is_none() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown onboarding step '{step_id}'"
        ))));
    }
    if !payload.is_object() {
        return Err(AppError::Core(CoreError::Validation(
            "Step payload must be a JSON object".into(),
        )));
    }

    let row = own_submission(&state, &auth).await?;
    SubmissionRepo::save_step(&state.pool, row.id, &step_id, &payload).await?;
    let row = refetch(&state, row.id).await?;
    response(row)
}

/// PUT /api/v1/submissions/me/current-step
pub async fn set_current_step(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CurrentStepRequest>,
) -> AppResult<Json<SubmissionResponse>> {
    if progress::find_step(&input.step_id).is_none() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown onboarding step '{}'",
            input.step_id
        ))));
    }
    let row = own_submission(&state, &auth).await?;
    SubmissionRepo::set_current_step(&state.pool, row.id, &input.step_id).await?;
    let row = refetch(&state, row.id).await?;
    response(row)
}

/// PUT /api/v1/submissions/me/company-info
pub async fn update_company_info(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CompanyInfoUpdate>,
) -> AppResult<Json<SubmissionResponse>> {
    let row = own_submission(&state, &auth).await?;
    let event = partner_event(
        &row,
        "Company Information Updated",
        "The partner updated their company information.",
    );
    SubmissionRepo::update_company_info(&state.pool, row.id, &input, &event).await?;
    let row = refetch(&state, row.id).await?;
    response(row)
}

/// PUT /api/v1/submissions/me/compliance-info
pub async fn update_compliance_info(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ComplianceUpdate>,
) -> AppResult<Json<SubmissionResponse>> {
    let row = own_submission(&state, &auth).await?;
    let event = partner_event(
        &row,
        "Compliance Information Updated",
        "The partner updated their compliance disclosures.",
    );
    SubmissionRepo::update_compliance_info(&state.pool, row.id, &input, &event).await?;
    let row = refetch(&state, row.id).await?;
    response(row)
}

/// PUT /api/v1/submissions/me/security-info
pub async fn update_security_info(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SecurityUpdate>,
) -> AppResult<Json<SubmissionResponse>> {
    let row = own_submission(&state, &auth).await?;
    let event = partner_event(
        &row,
        "Security Information Updated",
        "The partner updated their security posture answers.",
    );
    SubmissionRepo::update_security_info(&state.pool, row.id, &input, &event).await?;
    let row = refetch(&state, row.id).await?;
    response(row)
}

/// POST /api/v1/submissions/me/submit
///
/// Re-submission after changes were requested is allowed; re-submitting an
/// already submitted or approved application is a conflict.
pub async fn submit(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<SubmissionResponse>> {
    let row = own_submission(&state, &auth).await?;
    let status = SubmissionStatus::parse(&row.status)?;
    match status {
        SubmissionStatus::Submitted => {
            return Err(AppError::Core(CoreError::Conflict(
                "The application has already been submitted".into(),
            )))
        }
        SubmissionStatus::Approved => {
            return Err(AppError::Core(CoreError::Conflict(
                "The application is already approved".into(),
            )))
        }
        _ => {}
    }

    let event = partner_event(
        &row,
        "Application Submitted",
        "The application was submitted for review.",
    );
    SubmissionRepo::set_status(&state.pool, row.id, SubmissionStatus::Submitted, &event).await?;
    let row = refetch(&state, row.id).await?;
    response(row)
}

/// POST /api/v1/submissions/me/reset
///
/// Clears the wizard answers and parks the partner on the first step.
/// Uploaded documents, chat, and the audit timeline are kept.
pub async fn reset(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<SubmissionResponse>> {
    let row = own_submission(&state, &auth).await?;
    SubmissionRepo::reset_steps(&state.pool, row.id).await?;
    let row = refetch(&state, row.id).await?;
    response(row)
}

/// PUT /api/v1/submissions/{id}/status
///
/// Admin override of the aggregate status, recorded on the timeline.
pub async fn override_status(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(input): Json<StatusOverrideRequest>,
) -> AppResult<Json<SubmissionResponse>> {
    let status = SubmissionStatus::parse(&input.status)?;
    let actor = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;

    let event = TimelineEvent {
        icon: timeline_icons::REQUIRED.to_string(),
        title: "Status Changed".to_string(),
        actor: actor.email.clone(),
        date: Utc::now(),
        content: format!("Submission status set to '{status}'."),
        category: None,
    };
    let updated = SubmissionRepo::set_status(&state.pool, id, status, &event).await?;
    if !updated {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Submission",
            id,
        }));
    }
    let row = refetch(&state, id).await?;
    response(row)
}
