//! Notification entity model.

use onboard_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: EntityId,
    pub user_id: EntityId,
    pub message: String,
    pub link: String,
    pub is_read: bool,
    pub created_at: Timestamp,
}
