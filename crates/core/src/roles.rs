//! Well-known role name constants.
//!
//! These must match the seed vocabulary used by the `users.role` column.

pub const ROLE_PARTNER: &str = "partner";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUPERADMIN: &str = "superadmin";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_PARTNER, ROLE_ADMIN, ROLE_SUPERADMIN];

/// Returns `true` for roles with review/administration rights.
pub fn is_admin_role(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_SUPERADMIN
}

/// Validate that a role string is one of the accepted values.
pub fn validate_role(role: &str) -> Result<(), crate::error::CoreError> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(crate::error::CoreError::Validation(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        )))
    }
}
