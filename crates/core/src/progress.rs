//! Progress and completion calculator.
//!
//! Everything here is a pure function of submission state, recomputed on
//! every read and never persisted. Two views exist side by side: the fixed
//! document-section view (distinct uploaded fields vs. the per-section
//! requirement) and the dynamic 7-step wizard view (a step is complete iff
//! its saved payload is a non-empty object).

use serde::Serialize;

use crate::section::{Section, ALL_SECTIONS};
use crate::submission::Submission;

/// Route of the final confirmation screen, used when every section is
/// complete.
pub const CONFIRMATION_ROUTE: &str = "/confirmation";

// ---------------------------------------------------------------------------
// Dynamic step definitions
// ---------------------------------------------------------------------------

/// One step of the dynamic onboarding wizard.
#[derive(Debug, Clone, Copy)]
pub struct StepDef {
    pub id: &'static str,
    pub title: &'static str,
    pub route: &'static str,
}

/// The 7-step wizard, in order.
pub const ONBOARDING_STEPS: &[StepDef] = &[
    StepDef {
        id: "company-info",
        title: "Company Information",
        route: "/onboarding/company-info",
    },
    StepDef {
        id: "management-personnel",
        title: "Management & Key Personnel",
        route: "/onboarding/management-personnel",
    },
    StepDef {
        id: "licensing-regulatory",
        title: "Licensing & Regulatory Certification",
        route: "/onboarding/licensing-regulatory",
    },
    StepDef {
        id: "policies-governance",
        title: "Policies & Governance",
        route: "/onboarding/policies-governance",
    },
    StepDef {
        id: "business-address",
        title: "Business Address Verification",
        route: "/onboarding/business-address",
    },
    StepDef {
        id: "security-compliance",
        title: "Information & Cyber Security Compliance",
        route: "/onboarding/security-compliance",
    },
    StepDef {
        id: "monitoring-risk",
        title: "Monitoring & Risk",
        route: "/onboarding/monitoring-risk",
    },
];

/// Look up a step definition by id.
pub fn find_step(step_id: &str) -> Option<&'static StepDef> {
    ONBOARDING_STEPS.iter().find(|s| s.id == step_id)
}

// ---------------------------------------------------------------------------
// Document-section completion
// ---------------------------------------------------------------------------

/// Number of distinct document fields with at least one upload in the given
/// section. Multiple files under the same field count once: a
/// "multiple files allowed" field is satisfied by any attachment.
pub fn uploaded_count(submission: &Submission, section: Section) -> usize {
    let mut fields: Vec<&str> = submission
        .files
        .iter()
        .filter(|f| f.category == section)
        .map(|f| f.field_id.as_str())
        .collect();
    fields.sort_unstable();
    fields.dedup();
    fields.len()
}

/// Whether a section has all its required document fields covered.
pub fn section_complete(submission: &Submission, section: Section) -> bool {
    uploaded_count(submission, section) >= section.required_field_count()
}

/// Per-section upload progress, in canonical order.
#[derive(Debug, Clone, Serialize)]
pub struct SectionProgress {
    pub section: Section,
    pub uploaded: usize,
    pub required: usize,
    pub complete: bool,
}

/// Upload progress for every fixed section.
pub fn per_section_counts(submission: &Submission) -> Vec<SectionProgress> {
    ALL_SECTIONS
        .iter()
        .map(|section| {
            let uploaded = uploaded_count(submission, *section);
            let required = section.required_field_count();
            SectionProgress {
                section: *section,
                uploaded,
                required,
                complete: uploaded >= required,
            }
        })
        .collect()
}

/// The route the partner should land on next: the first incomplete section
/// in canonical order, or the confirmation screen once all are complete.
pub fn resume_route(submission: &Submission) -> &'static str {
    ALL_SECTIONS
        .iter()
        .find(|section| !section_complete(submission, **section))
        .map(|section| section.route())
        .unwrap_or(CONFIRMATION_ROUTE)
}

// ---------------------------------------------------------------------------
// Dynamic step progress
// ---------------------------------------------------------------------------

/// Display status of one wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Pending,
    Current,
    Completed,
}

/// Derived per-step status for the wizard UI.
#[derive(Debug, Clone, Serialize)]
pub struct StepStatus {
    pub id: &'static str,
    pub title: &'static str,
    pub route: &'static str,
    pub status: StepState,
    pub has_data: bool,
    /// A step can be opened iff it is at or before the current step, or
    /// already has data.
    pub is_accessible: bool,
}

/// Derived wizard progress for a submission.
#[derive(Debug, Clone, Serialize)]
pub struct StepProgress {
    pub current_step_index: usize,
    pub total_steps: usize,
    pub completed_steps: usize,
    pub progress_percentage: f64,
    pub steps: Vec<StepStatus>,
}

/// A step counts as complete iff its saved payload is a non-empty object.
fn step_has_data(submission: &Submission, step_id: &str) -> bool {
    submission
        .steps
        .get(step_id)
        .and_then(|v| v.as_object())
        .is_some_and(|obj| !obj.is_empty())
}

/// Compute the dynamic wizard progress.
pub fn step_progress(submission: &Submission) -> StepProgress {
    let current_step_index = submission
        .current_step
        .as_deref()
        .and_then(|id| ONBOARDING_STEPS.iter().position(|s| s.id == id))
        .unwrap_or(0);

    let completed_steps = ONBOARDING_STEPS
        .iter()
        .filter(|s| step_has_data(submission, s.id))
        .count();

    let total_steps = ONBOARDING_STEPS.len();
    let progress_percentage = 100.0 * completed_steps as f64 / total_steps as f64;

    let steps = ONBOARDING_STEPS
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let has_data = step_has_data(submission, step.id);
            let status = if has_data {
                StepState::Completed
            } else if index == current_step_index {
                StepState::Current
            } else {
                StepState::Pending
            };
            StepStatus {
                id: step.id,
                title: step.title,
                route: step.route,
                status,
                has_data,
                is_accessible: index <= current_step_index || has_data,
            }
        })
        .collect();

    StepProgress {
        current_step_index,
        total_steps,
        completed_steps,
        progress_percentage,
        steps,
    }
}
