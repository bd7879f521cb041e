//! User entity model and DTOs.

use onboard_core::permissions::{ActorProfile, StagePermissionsMap};
use onboard_core::types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses
/// directly. Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: EntityId,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub role: String,
    /// `None` means unrestricted review access for admin roles.
    pub stage_permissions: Option<Json<StagePermissionsMap>>,
    pub can_manage_users: bool,
    pub disabled: bool,
    pub created_at: Timestamp,
}

impl User {
    /// The name shown on submissions and timelines, falling back to email.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }

    /// Project this row into the domain actor used for permission checks.
    pub fn actor_profile(&self) -> ActorProfile {
        ActorProfile {
            id: self.id,
            email: self.email.clone(),
            role: self.role.clone(),
            stage_permissions: self.stage_permissions.as_ref().map(|j| j.0.clone()),
        }
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: EntityId,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub stage_permissions: Option<StagePermissionsMap>,
    pub can_manage_users: bool,
    pub disabled: bool,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            stage_permissions: user.stage_permissions.map(|j| j.0),
            can_manage_users: user.can_manage_users,
            disabled: user.disabled,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user. The password is hashed before this struct
/// is built.
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub can_manage_users: bool,
}

/// DTO for updating an existing user. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub role: Option<String>,
    pub can_manage_users: Option<bool>,
    pub disabled: Option<bool>,
}
