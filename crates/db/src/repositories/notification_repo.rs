//! Repository for the `notifications` table.

use onboard_core::conversation::NewNotification;
use onboard_core::types::EntityId;
use sqlx::PgPool;

use crate::models::notification::Notification;

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, message, link, is_read, created_at";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert one notification. The id is generated by the caller so the
    /// same value can be referenced before the write lands.
    pub async fn create(pool: &PgPool, input: &NewNotification) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, message, link, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(input.id)
        .bind(input.user_id)
        .bind(&input.message)
        .bind(&input.link)
        .bind(input.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Insert a batch of notifications, one per mentioned user.
    pub async fn create_all(
        pool: &PgPool,
        inputs: &[NewNotification],
    ) -> Result<(), sqlx::Error> {
        for input in inputs {
            Self::create(pool, input).await?;
        }
        Ok(())
    }

    /// List notifications for a user.
    ///
    /// When `unread_only` is `true`, only notifications with `is_read = false`
    /// are returned.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: EntityId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let filter = if unread_only {
            "AND is_read = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 {filter} \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Mark a single notification as read. Idempotent: re-marking an
    /// already-read notification is a no-op success.
    ///
    /// Returns `true` if the notification exists for the given user,
    /// `false` otherwise.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: EntityId,
        user_id: EntityId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark all unread notifications as read for a user.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool, user_id: EntityId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true \
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Get the number of unread notifications for a user.
    pub async fn unread_count(pool: &PgPool, user_id: EntityId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}
