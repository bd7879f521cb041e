//! Role-based access control (RBAC) extractor.
//!
//! [`RequireAdmin`] wraps [`AuthUser`] and rejects requests whose role does
//! not meet the minimum requirement. Section-level stage permissions are a
//! finer grain than this and are enforced inside the review engine, against
//! the database row rather than the token. Superadmin-only checks (user
//! management without the explicit grant) depend on the database row too,
//! so they live in the admin handlers rather than here.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use onboard_core::error::CoreError;
use onboard_core::roles::is_admin_role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` or `superadmin` role. Rejects with 403 Forbidden
/// otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     // user is guaranteed to hold an admin role here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !is_admin_role(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}
