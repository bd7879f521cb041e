//! Conversation and mention engine.
//!
//! Chat threads hang off a submission per section. Posting a message may
//! mention other users with `@email` tokens; each resolved mention produces
//! a mailbox notification for that user. Notification delivery is a
//! best-effort side channel: a failed delivery never rolls back the chat
//! message that triggered it.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::section::Section;
use crate::submission::{ChatMessage, ChatSender, TimelineEvent, timeline_icons};
use crate::types::{EntityId, Timestamp};

/// `@local@domain.tld` tokens. Matches greedily on non-whitespace, the same
/// loose shape the mention autocomplete produces.
static MENTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\S+@\S+\.\S+)").expect("mention pattern must compile"));

/// A directory entry used to resolve mentioned emails to user ids.
#[derive(Debug, Clone)]
pub struct KnownUser {
    pub id: EntityId,
    pub email: String,
}

/// A notification to be appended to a mentioned user's mailbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub id: EntityId,
    pub user_id: EntityId,
    pub message: String,
    /// Route to the submission the mention occurred in.
    pub link: String,
    pub created_at: Timestamp,
}

/// Render state of a section's thread. An empty thread is "no conversation",
/// rendered distinctly from a resolved one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    NoConversation,
    Open,
    Resolved,
}

/// Extract the email tokens mentioned in `text`, in order of occurrence.
pub fn extract_mention_emails(text: &str) -> Vec<String> {
    MENTION_PATTERN
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Resolve mentions in `text` against the known-user directory.
///
/// Returns the mentioned user ids in first-occurrence order. A user
/// mentioned twice in the same message is recorded once; emails that match
/// no known user are ignored.
pub fn resolve_mentions(text: &str, users: &[KnownUser]) -> Vec<EntityId> {
    let emails = extract_mention_emails(text);
    let mut seen = Vec::new();
    for email in &emails {
        if let Some(user) = users.iter().find(|u| &u.email == email) {
            if !seen.contains(&user.id) {
                seen.push(user.id);
            }
        }
    }
    seen
}

/// Build the chat message for an admin review comment.
pub fn compose_admin_comment(
    section: Section,
    text: &str,
    admin_email: &str,
    mentions: Vec<EntityId>,
    now: Timestamp,
) -> ChatMessage {
    ChatMessage {
        from: ChatSender::Admin,
        text: text.to_string(),
        time: now,
        category: section,
        admin_name: Some(admin_email.to_string()),
        resolved: false,
        mentions,
    }
}

/// Build the chat message and timeline event for a partner reply.
pub fn compose_partner_reply(
    section: Section,
    text: &str,
    now: Timestamp,
) -> (ChatMessage, TimelineEvent) {
    let message = ChatMessage {
        from: ChatSender::Partner,
        text: text.to_string(),
        time: now,
        category: section,
        admin_name: None,
        resolved: false,
        mentions: Vec::new(),
    };
    let event = TimelineEvent {
        icon: timeline_icons::COMMENT.to_string(),
        title: "Partner Replied".to_string(),
        actor: "Partner".to_string(),
        date: now,
        content: text.to_string(),
        category: Some(section),
    };
    (message, event)
}

/// Build one mailbox notification per mentioned user. Each gets a fresh
/// unique id; repeated mention events produce repeated notifications (no
/// cross-message dedup).
pub fn mention_notifications(
    mentioned: &[EntityId],
    actor_email: &str,
    partner_name: &str,
    submission_id: EntityId,
    now: Timestamp,
) -> Vec<NewNotification> {
    mentioned
        .iter()
        .map(|user_id| NewNotification {
            id: Uuid::new_v4(),
            user_id: *user_id,
            message: format!(
                "You were mentioned by {actor_email} in {partner_name}'s submission."
            ),
            link: format!("/admin/submission/{submission_id}"),
            created_at: now,
        })
        .collect()
}

/// Classify a section's thread for rendering and for the approval gate.
pub fn thread_state(thread: &[&ChatMessage]) -> ThreadState {
    if thread.is_empty() {
        ThreadState::NoConversation
    } else if thread.iter().all(|m| m.resolved) {
        ThreadState::Resolved
    } else {
        ThreadState::Open
    }
}
