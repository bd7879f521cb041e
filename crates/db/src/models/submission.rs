//! Submission entity model and DTOs.

use std::collections::BTreeMap;

use onboard_core::section::Section;
use onboard_core::submission::{
    ChatMessage, SectionStatus, Submission, SubmissionFile, SubmissionStatus, TimelineEvent,
};
use onboard_core::types::{EntityId, Timestamp};
use onboard_core::CoreError;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `submissions` table, with the partner's email joined in.
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub id: EntityId,
    pub partner_id: EntityId,
    pub partner_name: String,
    pub partner_email: Option<String>,
    pub status: String,
    pub current_step: Option<String>,
    pub section_status: Json<BTreeMap<Section, SectionStatus>>,
    pub files: Json<Vec<SubmissionFile>>,
    pub chat: Json<Vec<ChatMessage>>,
    pub timeline: Json<Vec<TimelineEvent>>,
    pub steps: Json<BTreeMap<String, serde_json::Value>>,
    pub company_name: Option<String>,
    pub business_description: Option<String>,
    pub company_url: Option<String>,
    pub pep_disclosure: Option<String>,
    pub pep_details: Option<String>,
    pub has_compliance_officer: Option<bool>,
    pub has_security_audits: Option<bool>,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
}

impl SubmissionRow {
    /// Build the domain aggregate the review and progress engines operate on.
    pub fn into_submission(self) -> Result<Submission, CoreError> {
        Ok(Submission {
            id: self.id,
            partner_id: self.partner_id,
            partner_name: self.partner_name,
            partner_email: self.partner_email,
            status: SubmissionStatus::parse(&self.status)?,
            section_status: self.section_status.0,
            files: self.files.0,
            chat: self.chat.0,
            timeline: self.timeline.0,
            steps: self.steps.0,
            current_step: self.current_step,
            created_at: self.created_at,
            last_updated: self.last_updated,
        })
    }

    /// The API-facing shape: the aggregate plus the section form fields.
    pub fn into_response(self) -> Result<SubmissionResponse, CoreError> {
        let form = SectionForms {
            company_name: self.company_name.clone(),
            business_description: self.business_description.clone(),
            company_url: self.company_url.clone(),
            pep_disclosure: self.pep_disclosure.clone(),
            pep_details: self.pep_details.clone(),
            has_compliance_officer: self.has_compliance_officer,
            has_security_audits: self.has_security_audits,
        };
        Ok(SubmissionResponse {
            submission: self.into_submission()?,
            form,
        })
    }
}

/// Structured form answers stored in dedicated columns.
#[derive(Debug, Clone, Serialize)]
pub struct SectionForms {
    pub company_name: Option<String>,
    pub business_description: Option<String>,
    pub company_url: Option<String>,
    pub pep_disclosure: Option<String>,
    pub pep_details: Option<String>,
    pub has_compliance_officer: Option<bool>,
    pub has_security_audits: Option<bool>,
}

/// Full submission payload returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResponse {
    #[serde(flatten)]
    pub submission: Submission,
    #[serde(flatten)]
    pub form: SectionForms,
}

/// DTO for the Company Information form.
#[derive(Debug, Deserialize)]
pub struct CompanyInfoUpdate {
    pub company_name: Option<String>,
    pub business_description: Option<String>,
    pub company_url: Option<String>,
}

/// DTO for the Compliance form.
#[derive(Debug, Deserialize)]
pub struct ComplianceUpdate {
    pub pep_disclosure: Option<String>,
    pub pep_details: Option<String>,
}

/// DTO for the Security form.
#[derive(Debug, Deserialize)]
pub struct SecurityUpdate {
    pub has_compliance_officer: Option<bool>,
    pub has_security_audits: Option<bool>,
}
