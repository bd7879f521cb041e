//! Handlers for the per-section conversation threads.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use onboard_core::conversation::{
    self, compose_admin_comment, compose_partner_reply, resolve_mentions, KnownUser, ThreadState,
};
use onboard_core::error::CoreError;
use onboard_core::section::Section;
use onboard_core::submission::ChatMessage;
use onboard_core::types::EntityId;
use onboard_db::models::submission::SubmissionResponse;
use onboard_db::repositories::{NotificationRepo, SubmissionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

use super::submission::{load_for_viewer, own_submission};

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    /// Stored section name, e.g. `"Security"`.
    pub section: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ThreadQuery {
    /// Stored section name. When absent, all threads the caller may see.
    pub section: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub messages: Vec<ChatMessage>,
    /// `"noConversation"`, `"open"` or `"resolved"`; only present for a
    /// single-section query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'static str>,
}

fn thread_state_label(state: ThreadState) -> &'static str {
    match state {
        ThreadState::NoConversation => "noConversation",
        ThreadState::Open => "open",
        ThreadState::Resolved => "resolved",
    }
}

fn validated_text(text: &str) -> AppResult<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Message text must not be empty".into(),
        )));
    }
    Ok(trimmed)
}

/// Directory used to resolve `@email` mentions. Covers every active
/// account: reviewers mention partners as often as each other.
async fn mention_directory(state: &AppState) -> AppResult<Vec<KnownUser>> {
    Ok(UserRepo::directory(&state.pool)
        .await?
        .into_iter()
        .map(|u| KnownUser {
            id: u.id,
            email: u.email,
        })
        .collect())
}

/// Deliver mention notifications after the message write has landed.
async fn deliver_mentions(
    state: &AppState,
    mentioned: &[EntityId],
    actor_email: &str,
    partner_name: &str,
    submission_id: EntityId,
) {
    let notifications = conversation::mention_notifications(
        mentioned,
        actor_email,
        partner_name,
        submission_id,
        Utc::now(),
    );
    if let Err(e) = NotificationRepo::create_all(&state.pool, &notifications).await {
        tracing::warn!(error = %e, submission_id = %submission_id, "Mention notification delivery failed");
    }
}

/// POST /api/v1/submissions/{id}/chat
///
/// Admin comment on a section thread. Requires the comment grant on the
/// section for restricted admins.
pub async fn post_admin_message(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(input): Json<PostMessageRequest>,
) -> AppResult<Json<SubmissionResponse>> {
    let section = Section::parse(&input.section)?;
    let text = validated_text(&input.text)?.to_string();

    let actor = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?
        .actor_profile();
    if !actor.can_review(section) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Not permitted to comment on the '{section}' section"
        ))));
    }

    let row = SubmissionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Submission",
            id,
        }))?;

    let directory = mention_directory(&state).await?;
    let mentions = resolve_mentions(&text, &directory);
    let message = compose_admin_comment(section, &text, &actor.email, mentions.clone(), Utc::now());

    SubmissionRepo::append_chat(&state.pool, id, &message, None).await?;
    deliver_mentions(&state, &mentions, &actor.email, &row.partner_name, id).await;

    let row = SubmissionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;
    Ok(Json(row.into_response()?))
}

/// POST /api/v1/submissions/me/chat
///
/// Partner reply on their own submission's thread. Replies land on the
/// timeline as well as the thread.
pub async fn post_partner_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<PostMessageRequest>,
) -> AppResult<Json<SubmissionResponse>> {
    let section = Section::parse(&input.section)?;
    let text = validated_text(&input.text)?.to_string();

    let row = own_submission(&state, &auth).await?;
    let (message, event) = compose_partner_reply(section, &text, Utc::now());
    SubmissionRepo::append_chat(&state.pool, row.id, &message, Some(&event)).await?;

    // Partners can @-mention reviewers too; resolution runs against the
    // same directory.
    let directory = mention_directory(&state).await?;
    let mentions = resolve_mentions(&text, &directory);
    let partner_email = row.partner_email.clone().unwrap_or_default();
    deliver_mentions(&state, &mentions, &partner_email, &row.partner_name, row.id).await;

    let row = SubmissionRepo::find_by_id(&state.pool, row.id)
        .await?
        .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;
    Ok(Json(row.into_response()?))
}

/// GET /api/v1/submissions/{id}/chat
///
/// One section's thread (with its render state), or every thread the
/// caller may see. Restricted admins only receive sections they hold a
/// view grant on; the owning partner sees everything.
pub async fn get_chat(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Query(query): Query<ThreadQuery>,
) -> AppResult<Json<ThreadResponse>> {
    let row = load_for_viewer(&state, &auth, id).await?;
    let is_owner = row.partner_id == auth.user_id;
    let submission = row.into_submission()?;

    match query.section {
        Some(name) => {
            let section = Section::parse(&name)?;
            if !is_owner {
                let actor = UserRepo::find_by_id(&state.pool, auth.user_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Core(CoreError::Unauthorized("Unknown user".into()))
                    })?
                    .actor_profile();
                if !actor.can_view(section) {
                    return Err(AppError::Core(CoreError::Forbidden(format!(
                        "Not permitted to view the '{section}' section"
                    ))));
                }
            }
            let thread = submission.section_thread(section);
            let state_label = thread_state_label(conversation::thread_state(&thread));
            Ok(Json(ThreadResponse {
                messages: thread.into_iter().cloned().collect(),
                state: Some(state_label),
            }))
        }
        None => {
            let messages = if is_owner {
                submission.chat.clone()
            } else {
                let actor = UserRepo::find_by_id(&state.pool, auth.user_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Core(CoreError::Unauthorized("Unknown user".into()))
                    })?
                    .actor_profile();
                submission
                    .chat
                    .iter()
                    .filter(|m| actor.can_view(m.category))
                    .cloned()
                    .collect()
            };
            Ok(Json(ThreadResponse {
                messages,
                state: None,
            }))
        }
    }
}
