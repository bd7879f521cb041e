//! Section review state machine.
//!
//! Per section: `pending -> approved` (terminal) and
//! `pending <-> changesRequested` (reopenable by further review). Approving
//! a section resolves every message in its thread as part of the same
//! patch, so the "all chat resolved" gate holds by construction.
//!
//! [`plan_review`] is pure: it validates, authorizes, and produces a
//! [`ReviewPatch`] describing every side effect. The persistence layer must
//! apply the patch as a single atomic update; partial application (status
//! updated but timeline not appended) is a correctness bug, not a degraded
//! mode. No retries happen at this layer -- a failed write surfaces to the
//! caller, which must revert any optimistic local state.

use std::collections::BTreeMap;

use crate::conversation::{self, KnownUser, NewNotification};
use crate::error::CoreError;
use crate::permissions::ActorProfile;
use crate::section::{Section, ALL_SECTIONS};
use crate::submission::{
    timeline_icons, ChatMessage, SectionStatus, Submission, SubmissionStatus, TimelineEvent,
};
use crate::types::Timestamp;

/// The two review decisions an admin can take on a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    RequestChanges,
}

impl ReviewAction {
    /// Parse the wire form. Malformed actions are a validation error.
    pub fn parse(action: &str) -> Result<Self, CoreError> {
        match action {
            "approve" => Ok(ReviewAction::Approve),
            "requestChanges" => Ok(ReviewAction::RequestChanges),
            other => Err(CoreError::Validation(format!(
                "Invalid review action '{other}'. Must be one of: approve, requestChanges"
            ))),
        }
    }
}

/// Every side effect of one review decision, applied atomically.
#[derive(Debug, Clone)]
pub struct ReviewPatch {
    pub section: Section,
    /// Fully materialized replacement for the section status map.
    pub section_status: BTreeMap<Section, SectionStatus>,
    /// The aggregate status after this decision.
    pub status: SubmissionStatus,
    /// Approve path: the whole chat list with this section's messages
    /// resolved. `None` when the chat is untouched.
    pub chat_rewrite: Option<Vec<ChatMessage>>,
    /// Request-changes path: the admin comment to append to the thread.
    pub chat_append: Option<ChatMessage>,
    /// The audit log entry for this decision.
    pub timeline_event: TimelineEvent,
    /// Mailbox notifications for users mentioned in the comment. Delivered
    /// best-effort, independently of the submission patch.
    pub notifications: Vec<NewNotification>,
}

/// Compute the aggregate status implied by a section status map: approved
/// iff every fixed section is approved. Always recomputed, never cached.
pub fn all_sections_approved(section_status: &BTreeMap<Section, SectionStatus>) -> bool {
    ALL_SECTIONS
        .iter()
        .all(|s| section_status.get(s) == Some(&SectionStatus::Approved))
}

/// Plan the patch for one review decision.
///
/// Authorization is checked here, fail closed: the actor must hold review
/// rights on the section regardless of what the HTTP layer already
/// verified. Re-reviewing an approved section is a conflict -- approval is
/// terminal and no reopen operation exists.
pub fn plan_review(
    submission: &Submission,
    section: Section,
    action: ReviewAction,
    actor: &ActorProfile,
    comment: Option<&str>,
    directory: &[KnownUser],
    now: Timestamp,
) -> Result<ReviewPatch, CoreError> {
    if !actor.can_review(section) {
        return Err(CoreError::Forbidden(format!(
            "Not permitted to review the '{section}' section"
        )));
    }
    if submission.section_status(section) == SectionStatus::Approved {
        return Err(CoreError::Conflict(format!(
            "The '{section}' section is already approved"
        )));
    }

    let mut section_status = submission.section_status.clone();
    let comment = comment.map(str::trim).filter(|c| !c.is_empty());

    match action {
        ReviewAction::Approve => {
            section_status.insert(section, SectionStatus::Approved);

            let chat_rewrite = submission
                .chat
                .iter()
                .cloned()
                .map(|mut m| {
                    if m.category == section {
                        m.resolved = true;
                    }
                    m
                })
                .collect::<Vec<_>>();

            let status = if all_sections_approved(&section_status) {
                SubmissionStatus::Approved
            } else {
                submission.status
            };

            Ok(ReviewPatch {
                section,
                section_status,
                status,
                chat_rewrite: Some(chat_rewrite),
                chat_append: None,
                timeline_event: TimelineEvent {
                    icon: timeline_icons::SUBMITTED.to_string(),
                    title: "Section Approved".to_string(),
                    actor: actor.email.clone(),
                    date: now,
                    content: format!("The '{section}' section has been approved."),
                    category: Some(section),
                },
                notifications: Vec::new(),
            })
        }

        ReviewAction::RequestChanges => {
            section_status.insert(section, SectionStatus::ChangesRequested);

            // With no comment this is a status-only rejection: timeline and
            // status change, no chat message.
            let (chat_append, notifications) = match comment {
                None => (None, Vec::new()),
                Some(text) => {
                    let mentions = conversation::resolve_mentions(text, directory);
                    let notifications = conversation::mention_notifications(
                        &mentions,
                        &actor.email,
                        &submission.partner_name,
                        submission.id,
                        now,
                    );
                    let message =
                        conversation::compose_admin_comment(section, text, &actor.email, mentions, now);
                    (Some(message), notifications)
                }
            };

            Ok(ReviewPatch {
                section,
                section_status,
                status: SubmissionStatus::RequiresAttention,
                chat_rewrite: None,
                chat_append,
                timeline_event: TimelineEvent {
                    icon: timeline_icons::REQUIRED.to_string(),
                    title: "Changes Requested".to_string(),
                    actor: actor.email.clone(),
                    date: now,
                    content: comment
                        .map(str::to_string)
                        .unwrap_or_else(|| "Admin requested changes for this section.".to_string()),
                    category: Some(section),
                },
                notifications,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles;
    use chrono::Utc;
    use uuid::Uuid;

    fn admin() -> ActorProfile {
        ActorProfile {
            id: Uuid::new_v4(),
            email: "reviewer@example.com".to_string(),
            role: roles::ROLE_ADMIN.to_string(),
            stage_permissions: None,
        }
    }

    fn submission() -> Submission {
        let now = Utc::now();
        Submission {
            id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            partner_name: "Acme Ltd".to_string(),
            partner_email: None,
            status: SubmissionStatus::InProgress,
            section_status: Submission::initial_section_status(),
            files: Vec::new(),
            chat: Vec::new(),
            timeline: Vec::new(),
            steps: BTreeMap::new(),
            current_step: None,
            created_at: now,
            last_updated: now,
        }
    }

    fn open_message(section: Section) -> ChatMessage {
        ChatMessage {
            from: crate::submission::ChatSender::Partner,
            text: "please advise".to_string(),
            time: Utc::now(),
            category: section,
            admin_name: None,
            resolved: false,
            mentions: Vec::new(),
        }
    }

    #[test]
    fn approve_resolves_every_message_in_the_section() {
        let mut sub = submission();
        sub.chat.push(open_message(Section::Compliance));
        sub.chat.push(open_message(Section::Compliance));
        sub.chat.push(open_message(Section::Security));

        let patch = plan_review(
            &sub,
            Section::Compliance,
            ReviewAction::Approve,
            &admin(),
            None,
            &[],
            Utc::now(),
        )
        .unwrap();

        let chat = patch.chat_rewrite.unwrap();
        assert!(chat
            .iter()
            .filter(|m| m.category == Section::Compliance)
            .all(|m| m.resolved));
        // Other sections' threads are untouched.
        assert!(chat
            .iter()
            .filter(|m| m.category == Section::Security)
            .all(|m| !m.resolved));
    }

    #[test]
    fn approving_one_section_leaves_aggregate_status_unchanged() {
        let sub = submission();
        let patch = plan_review(
            &sub,
            Section::CompanyInformation,
            ReviewAction::Approve,
            &admin(),
            None,
            &[],
            Utc::now(),
        )
        .unwrap();

        assert_eq!(
            patch.section_status.get(&Section::CompanyInformation),
            Some(&SectionStatus::Approved)
        );
        assert_eq!(
            patch.section_status.get(&Section::Compliance),
            Some(&SectionStatus::Pending)
        );
        assert_eq!(patch.status, SubmissionStatus::InProgress);
        assert_eq!(patch.timeline_event.title, "Section Approved");
        assert_eq!(patch.timeline_event.icon, timeline_icons::SUBMITTED);
        assert_eq!(
            patch.timeline_event.content,
            "The 'Company Information' section has been approved."
        );
    }

    #[test]
    fn approving_the_last_section_approves_the_aggregate() {
        let mut sub = submission();
        for section in ALL_SECTIONS {
            if *section != Section::Attestations {
                sub.section_status.insert(*section, SectionStatus::Approved);
            }
        }

        let patch = plan_review(
            &sub,
            Section::Attestations,
            ReviewAction::Approve,
            &admin(),
            None,
            &[],
            Utc::now(),
        )
        .unwrap();

        assert_eq!(patch.status, SubmissionStatus::Approved);
        assert!(all_sections_approved(&patch.section_status));
    }

    #[test]
    fn aggregate_not_approved_while_any_section_is_not() {
        let mut map = Submission::initial_section_status();
        for section in ALL_SECTIONS {
            map.insert(*section, SectionStatus::Approved);
        }
        assert!(all_sections_approved(&map));

        map.insert(Section::Security, SectionStatus::Pending);
        assert!(!all_sections_approved(&map));
    }

    #[test]
    fn request_changes_always_sets_requires_attention() {
        let mut sub = submission();
        // Even with every other section already approved.
        for section in ALL_SECTIONS {
            if *section != Section::Compliance {
                sub.section_status.insert(*section, SectionStatus::Approved);
            }
        }

        let patch = plan_review(
            &sub,
            Section::Compliance,
            ReviewAction::RequestChanges,
            &admin(),
            None,
            &[],
            Utc::now(),
        )
        .unwrap();

        assert_eq!(patch.status, SubmissionStatus::RequiresAttention);
        assert_eq!(
            patch.section_status.get(&Section::Compliance),
            Some(&SectionStatus::ChangesRequested)
        );
        assert_eq!(patch.timeline_event.title, "Changes Requested");
        assert_eq!(patch.timeline_event.icon, timeline_icons::REQUIRED);
        assert_eq!(
            patch.timeline_event.content,
            "Admin requested changes for this section."
        );
        // Status-only rejection: no chat message.
        assert!(patch.chat_append.is_none());
        assert!(patch.notifications.is_empty());
    }

    #[test]
    fn request_changes_with_comment_posts_chat_and_notifies_mentions() {
        let sub = submission();
        let mentioned = KnownUser {
            id: Uuid::new_v4(),
            email: "partner@x.com".to_string(),
        };
        let directory = vec![mentioned.clone()];

        let patch = plan_review(
            &sub,
            Section::Security,
            ReviewAction::RequestChanges,
            &admin(),
            Some("@partner@x.com please redo this"),
            &directory,
            Utc::now(),
        )
        .unwrap();

        let message = patch.chat_append.unwrap();
        assert_eq!(message.text, "@partner@x.com please redo this");
        assert_eq!(message.mentions, vec![mentioned.id]);
        assert!(!message.resolved);
        assert_eq!(message.admin_name.as_deref(), Some("reviewer@example.com"));

        assert_eq!(patch.notifications.len(), 1);
        assert_eq!(patch.notifications[0].user_id, mentioned.id);
        assert!(!patch.notifications[0].message.is_empty());

        // The comment also becomes the timeline content.
        assert_eq!(patch.timeline_event.content, "@partner@x.com please redo this");
    }

    #[test]
    fn blank_comment_is_treated_as_status_only() {
        let sub = submission();
        let patch = plan_review(
            &sub,
            Section::Compliance,
            ReviewAction::RequestChanges,
            &admin(),
            Some("   "),
            &[],
            Utc::now(),
        )
        .unwrap();

        assert!(patch.chat_append.is_none());
        assert_eq!(
            patch.timeline_event.content,
            "Admin requested changes for this section."
        );
    }

    #[test]
    fn approved_section_cannot_be_reviewed_again() {
        let mut sub = submission();
        sub.section_status
            .insert(Section::Attestations, SectionStatus::Approved);

        let result = plan_review(
            &sub,
            Section::Attestations,
            ReviewAction::RequestChanges,
            &admin(),
            None,
            &[],
            Utc::now(),
        );

        assert!(matches!(result, Err(CoreError::Conflict(_))));
    }

    #[test]
    fn partner_actor_is_rejected_fail_closed() {
        let sub = submission();
        let mut actor = admin();
        actor.role = roles::ROLE_PARTNER.to_string();

        let result = plan_review(
            &sub,
            Section::Compliance,
            ReviewAction::Approve,
            &actor,
            None,
            &[],
            Utc::now(),
        );

        assert!(matches!(result, Err(CoreError::Forbidden(_))));
    }

    #[test]
    fn changes_requested_section_can_be_approved_later() {
        let mut sub = submission();
        sub.section_status
            .insert(Section::Security, SectionStatus::ChangesRequested);
        sub.status = SubmissionStatus::RequiresAttention;

        let patch = plan_review(
            &sub,
            Section::Security,
            ReviewAction::Approve,
            &admin(),
            None,
            &[],
            Utc::now(),
        )
        .unwrap();

        assert_eq!(
            patch.section_status.get(&Section::Security),
            Some(&SectionStatus::Approved)
        );
        // Other sections still pending, so aggregate stays as it was.
        assert_eq!(patch.status, SubmissionStatus::RequiresAttention);
    }

    #[test]
    fn malformed_action_string_rejected() {
        assert!(ReviewAction::parse("approve").is_ok());
        assert!(ReviewAction::parse("requestChanges").is_ok());
        let result = ReviewAction::parse("reject");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid review action"));
    }
}
