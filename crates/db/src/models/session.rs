//! Refresh-token session model.

use onboard_core::types::{EntityId, Timestamp};
use sqlx::FromRow;

/// A row from the `user_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub id: EntityId,
    pub user_id: EntityId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
    pub created_at: Timestamp,
}

/// Input for inserting a new session.
#[derive(Debug)]
pub struct CreateSession {
    pub user_id: EntityId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
}
