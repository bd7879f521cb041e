//! The `Submission` aggregate: one document per partner tracking their
//! onboarding application, mutated by the partner and by admin reviewers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::section::{Section, ALL_SECTIONS};
use crate::types::{EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Status vocabularies
// ---------------------------------------------------------------------------

/// Aggregate submission status.
///
/// The canonical stored vocabulary is the lowercase-hyphenated set; the
/// `Display` impl yields the title-cased copy used in timeline text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionStatus {
    NotStarted,
    InProgress,
    Submitted,
    RequiresAttention,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    /// The stored kebab-case form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::NotStarted => "not-started",
            SubmissionStatus::InProgress => "in-progress",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::RequiresAttention => "requires-attention",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    /// Parse the stored kebab-case form.
    pub fn parse(status: &str) -> Result<Self, crate::error::CoreError> {
        match status {
            "not-started" => Ok(SubmissionStatus::NotStarted),
            "in-progress" => Ok(SubmissionStatus::InProgress),
            "submitted" => Ok(SubmissionStatus::Submitted),
            "requires-attention" => Ok(SubmissionStatus::RequiresAttention),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            other => Err(crate::error::CoreError::Validation(format!(
                "Invalid submission status '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SubmissionStatus::NotStarted => "Not Started",
            SubmissionStatus::InProgress => "In Progress",
            SubmissionStatus::Submitted => "Submitted",
            SubmissionStatus::RequiresAttention => "Requires Attention",
            SubmissionStatus::Approved => "Approved",
            SubmissionStatus::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

/// Per-section review status. `Approved` is terminal for the section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionStatus {
    Pending,
    Approved,
    ChangesRequested,
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Icon keys used by timeline events. The UI maps these to glyphs.
pub mod timeline_icons {
    pub const SUBMITTED: &str = "submitted";
    pub const REQUIRED: &str = "required";
    pub const COMMENT: &str = "comment";
}

/// One entry in the append-only audit log of a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub icon: String,
    pub title: String,
    pub actor: String,
    pub date: Timestamp,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Section>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    Admin,
    Partner,
}

/// A message in a section's conversation thread. Append-only; `resolved`
/// flags are rewritten in bulk when the section is approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub from: ChatSender,
    pub text: String,
    pub time: Timestamp,
    pub category: Section,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_name: Option<String>,
    pub resolved: bool,
    #[serde(default)]
    pub mentions: Vec<EntityId>,
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// An uploaded compliance document. One unified schema: every file is
/// attached to a section and a named document field within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionFile {
    pub id: EntityId,
    pub name: String,
    pub url: String,
    /// Full path in the backing object store; used for deletion.
    pub storage_path: String,
    pub category: Section,
    pub field_id: String,
    pub uploaded_at: Timestamp,
    /// File size in bytes, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

// ---------------------------------------------------------------------------
// The aggregate
// ---------------------------------------------------------------------------

/// One partner's onboarding application. Created lazily on first partner
/// access and never deleted through normal flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: EntityId,
    pub partner_id: EntityId,
    pub partner_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_email: Option<String>,
    pub status: SubmissionStatus,
    pub section_status: BTreeMap<Section, SectionStatus>,
    pub files: Vec<SubmissionFile>,
    pub chat: Vec<ChatMessage>,
    pub timeline: Vec<TimelineEvent>,
    /// Dynamic-step payloads, keyed by step id. A step counts as complete
    /// iff its payload is a non-empty object.
    pub steps: BTreeMap<String, serde_json::Value>,
    /// The step the partner last navigated to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
}

impl Submission {
    /// The section status map a fresh submission starts with: every fixed
    /// section pending.
    pub fn initial_section_status() -> BTreeMap<Section, SectionStatus> {
        ALL_SECTIONS
            .iter()
            .map(|s| (*s, SectionStatus::Pending))
            .collect()
    }

    /// Status of one section, defaulting to pending for sections the stored
    /// map has not seen yet.
    pub fn section_status(&self, section: Section) -> SectionStatus {
        self.section_status
            .get(&section)
            .copied()
            .unwrap_or(SectionStatus::Pending)
    }

    /// The chat messages belonging to one section's thread, in insertion
    /// order.
    pub fn section_thread(&self, section: Section) -> Vec<&ChatMessage> {
        self.chat.iter().filter(|m| m.category == section).collect()
    }
}
