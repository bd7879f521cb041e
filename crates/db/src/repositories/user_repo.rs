//! Repository for the `users` table.

use onboard_core::permissions::StagePermissionsMap;
use onboard_core::types::EntityId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, name, password_hash, role, stage_permissions, \
                       can_manage_users, disabled, created_at";

/// Provides CRUD operations for user accounts.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, name, password_hash, role, can_manage_users) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.name)
            .bind(&input.password_hash)
            .bind(&input.role)
            .bind(input.can_manage_users)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: EntityId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// List all users, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users ORDER BY created_at DESC");
        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// The directory that mention resolution draws from: every active
    /// account, partners included. Disabled accounts are excluded.
    pub async fn directory(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE disabled = false ORDER BY email"
        );
        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// Partially update a user. Absent fields keep their current value.
    pub async fn update(
        pool: &PgPool,
        id: EntityId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET \
                 name = COALESCE($2, name), \
                 role = COALESCE($3, role), \
                 can_manage_users = COALESCE($4, can_manage_users), \
                 disabled = COALESCE($5, disabled) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.role)
            .bind(input.can_manage_users)
            .bind(input.disabled)
            .fetch_optional(pool)
            .await
    }

    /// Replace the per-section review grants. `None` clears the map back to
    /// unrestricted.
    pub async fn set_stage_permissions(
        pool: &PgPool,
        id: EntityId,
        permissions: Option<&StagePermissionsMap>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET stage_permissions = $2 WHERE id = $1")
            .bind(id)
            .bind(permissions.map(Json))
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_password_hash(
        pool: &PgPool,
        id: EntityId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user. Sessions and notifications go with the row via
    /// `ON DELETE CASCADE`; already-issued access tokens stay valid until
    /// they expire.
    pub async fn delete(pool: &PgPool, id: EntityId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Total number of user accounts. Used to gate first-run setup.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        Ok(count.unwrap_or(0))
    }
}
