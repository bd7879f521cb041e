//! Repository for the `submissions` table.
//!
//! The aggregate's list-shaped pieces (files, chat, timeline) live in JSONB
//! columns and are only ever grown through the `||` operator, so concurrent
//! writers append rather than clobber each other. Review writes replace
//! `section_status` and `status` wholesale; the last reviewer wins.

use chrono::Utc;
use onboard_core::progress::ONBOARDING_STEPS;
use onboard_core::review::ReviewPatch;
use onboard_core::submission::{
    timeline_icons, ChatMessage, Submission, SubmissionFile, SubmissionStatus, TimelineEvent,
};
use onboard_core::types::EntityId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::submission::{
    CompanyInfoUpdate, ComplianceUpdate, SecurityUpdate, SubmissionRow,
};
use crate::models::user::User;

/// Column list for `submissions` queries, with the partner's email joined
/// from `users`.
const COLUMNS: &str = "s.id, s.partner_id, s.partner_name, u.email AS partner_email, \
                       s.status, s.current_step, s.section_status, s.files, s.chat, \
                       s.timeline, s.steps, s.company_name, s.business_description, \
                       s.company_url, s.pep_disclosure, s.pep_details, \
                       s.has_compliance_officer, s.has_security_audits, \
                       s.created_at, s.last_updated";

const FROM: &str = "FROM submissions s LEFT JOIN users u ON u.id = s.partner_id";

/// Provides CRUD operations for onboarding submissions.
pub struct SubmissionRepo;

impl SubmissionRepo {
    /// Fetch the partner's submission, creating it on first access.
    ///
    /// The submission id is the partner's user id; the unique constraint on
    /// `partner_id` plus `ON CONFLICT DO NOTHING` makes concurrent first
    /// requests converge on a single row.
    pub async fn get_or_create(pool: &PgPool, partner: &User) -> Result<SubmissionRow, sqlx::Error> {
        if let Some(row) = Self::find_by_partner(pool, partner.id).await? {
            return Ok(row);
        }

        let opened = TimelineEvent {
            icon: timeline_icons::SUBMITTED.to_string(),
            title: "Application Started".to_string(),
            actor: "System".to_string(),
            date: Utc::now(),
            content: "Your onboarding application has been created.".to_string(),
            category: None,
        };
        sqlx::query(
            "INSERT INTO submissions \
                 (id, partner_id, partner_name, status, current_step, section_status, timeline) \
             VALUES ($1, $1, $2, $3, $4, $5, $6) \
             ON CONFLICT (partner_id) DO NOTHING",
        )
        .bind(partner.id)
        .bind(partner.display_name())
        .bind(SubmissionStatus::InProgress.as_str())
        .bind(ONBOARDING_STEPS[0].id)
        .bind(Json(Submission::initial_section_status()))
        .bind(Json(vec![opened]))
        .execute(pool)
        .await?;

        Self::find_by_partner(pool, partner.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: EntityId,
    ) -> Result<Option<SubmissionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} {FROM} WHERE s.id = $1");
        sqlx::query_as::<_, SubmissionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_partner(
        pool: &PgPool,
        partner_id: EntityId,
    ) -> Result<Option<SubmissionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} {FROM} WHERE s.partner_id = $1");
        sqlx::query_as::<_, SubmissionRow>(&query)
            .bind(partner_id)
            .fetch_optional(pool)
            .await
    }

    /// List all submissions for the admin review queue, most recently
    /// touched first.
    pub async fn list(pool: &PgPool) -> Result<Vec<SubmissionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} {FROM} ORDER BY s.last_updated DESC");
        sqlx::query_as::<_, SubmissionRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Apply a planned review outcome in a single UPDATE.
    ///
    /// Approvals rewrite the chat (resolving the section's thread); change
    /// requests append the reviewer's comment, if any. The timeline event is
    /// always appended.
    pub async fn apply_review(
        pool: &PgPool,
        id: EntityId,
        patch: &ReviewPatch,
    ) -> Result<bool, sqlx::Error> {
        let result = match &patch.chat_rewrite {
            Some(chat) => {
                sqlx::query(
                    "UPDATE submissions SET \
                         section_status = $2, status = $3, chat = $4, \
                         timeline = timeline || $5, last_updated = NOW() \
                     WHERE id = $1",
                )
                .bind(id)
                .bind(Json(&patch.section_status))
                .bind(patch.status.as_str())
                .bind(Json(chat))
                .bind(Json(&patch.timeline_event))
                .execute(pool)
                .await?
            }
            None => {
                sqlx::query(
                    "UPDATE submissions SET \
                         section_status = $2, status = $3, \
                         chat = chat || COALESCE($4, '[]'::jsonb), \
                         timeline = timeline || $5, last_updated = NOW() \
                     WHERE id = $1",
                )
                .bind(id)
                .bind(Json(&patch.section_status))
                .bind(patch.status.as_str())
                .bind(patch.chat_append.as_ref().map(Json))
                .bind(Json(&patch.timeline_event))
                .execute(pool)
                .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    /// Append one chat message, and optionally a timeline event, additively.
    pub async fn append_chat(
        pool: &PgPool,
        id: EntityId,
        message: &ChatMessage,
        timeline_event: Option<&TimelineEvent>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE submissions SET \
                 chat = chat || $2, \
                 timeline = timeline || COALESCE($3, '[]'::jsonb), \
                 last_updated = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(Json(message))
        .bind(timeline_event.map(Json))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record an uploaded file against the submission.
    pub async fn append_file(
        pool: &PgPool,
        id: EntityId,
        file: &SubmissionFile,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE submissions SET files = files || $2, last_updated = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(Json(file))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the file list wholesale. Used by removal, which has to drop
    /// one element from the middle of the array.
    pub async fn replace_files(
        pool: &PgPool,
        id: EntityId,
        files: &[SubmissionFile],
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE submissions SET files = $2, last_updated = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(Json(files))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Store a dynamic step's payload and move the bookmark onto that step.
    pub async fn save_step(
        pool: &PgPool,
        id: EntityId,
        step_id: &str,
        payload: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE submissions SET \
                 steps = jsonb_set(steps, ARRAY[$2], $3, true), \
                 current_step = $2, last_updated = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(step_id)
        .bind(Json(payload))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move the partner's navigation bookmark without writing step data.
    pub async fn set_current_step(
        pool: &PgPool,
        id: EntityId,
        step_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE submissions SET current_step = $2, last_updated = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(step_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_company_info(
        pool: &PgPool,
        id: EntityId,
        input: &CompanyInfoUpdate,
        event: &TimelineEvent,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE submissions SET \
                 company_name = $2, business_description = $3, company_url = $4, \
                 timeline = timeline || $5, last_updated = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.company_name)
        .bind(&input.business_description)
        .bind(&input.company_url)
        .bind(Json(event))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_compliance_info(
        pool: &PgPool,
        id: EntityId,
        input: &ComplianceUpdate,
        event: &TimelineEvent,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE submissions SET \
                 pep_disclosure = $2, pep_details = $3, \
                 timeline = timeline || $4, last_updated = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.pep_disclosure)
        .bind(&input.pep_details)
        .bind(Json(event))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_security_info(
        pool: &PgPool,
        id: EntityId,
        input: &SecurityUpdate,
        event: &TimelineEvent,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE submissions SET \
                 has_compliance_officer = $2, has_security_audits = $3, \
                 timeline = timeline || $4, last_updated = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.has_compliance_officer)
        .bind(input.has_security_audits)
        .bind(Json(event))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the aggregate status and record why on the timeline. Used by
    /// final submission and the admin status override.
    pub async fn set_status(
        pool: &PgPool,
        id: EntityId,
        status: SubmissionStatus,
        event: &TimelineEvent,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE submissions SET \
                 status = $2, timeline = timeline || $3, last_updated = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(Json(event))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Wipe the dynamic-step answers and park the partner back on the first
    /// step. Files, chat, timeline and review state are untouched.
    pub async fn reset_steps(pool: &PgPool, id: EntityId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE submissions SET \
                 steps = '{}'::jsonb, current_step = $2, \
                 status = $3, last_updated = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(ONBOARDING_STEPS[0].id)
        .bind(SubmissionStatus::InProgress.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
