//! Handlers for `/admin`: user management, stage permissions, and the
//! dashboard metrics.
//!
//! User management requires more than the admin role: plain admins must
//! also carry the `can_manage_users` grant, which lives on the database row
//! rather than in the token, so the gate re-reads the caller's profile.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use onboard_core::error::CoreError;
use onboard_core::permissions::StagePermissionsMap;
use onboard_core::roles::{is_admin_role, validate_role, ROLE_SUPERADMIN};
use onboard_core::types::EntityId;
use onboard_db::models::dashboard::DashboardMetrics;
use onboard_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use onboard_db::repositories::{DashboardRepo, SessionRepo, UserRepo};
use serde::Deserialize;

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub can_manage_users: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// Re-read the caller's row and require user-management rights: the
/// superadmin role, or an admin with `can_manage_users`.
async fn require_user_manager(state: &AppState, user_id: EntityId) -> AppResult<User> {
    let caller = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;
    let allowed =
        caller.role == ROLE_SUPERADMIN || (is_admin_role(&caller.role) && caller.can_manage_users);
    if !allowed {
        return Err(AppError::Core(CoreError::Forbidden(
            "User management permission required".into(),
        )));
    }
    Ok(caller)
}

/// GET /api/v1/admin/users
pub async fn list_users(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserResponse>>> {
    require_user_manager(&state, auth.user_id).await?;
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /api/v1/admin/users
pub async fn create_user(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    require_user_manager(&state, auth.user_id).await?;

    validate_role(&input.role).map_err(AppError::Core)?;
    validate_password_strength(&input.password).map_err(AppError::BadRequest)?;
    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email: input.email,
            name: input.name,
            password_hash,
            role: input.role,
            can_manage_users: input.can_manage_users,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<Json<UserResponse>> {
    require_user_manager(&state, auth.user_id).await?;
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    Ok(Json(UserResponse::from(user)))
}

/// PUT /api/v1/admin/users/{id}
pub async fn update_user(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<Json<UserResponse>> {
    require_user_manager(&state, auth.user_id).await?;
    if let Some(role) = &input.role {
        validate_role(role).map_err(AppError::Core)?;
    }
    let user = UserRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Removes the account row; sessions and notifications cascade with it.
/// Access tokens already issued to the user stay valid until expiry -- the
/// deletion is complete once they age out.
pub async fn delete_user(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    require_user_manager(&state, auth.user_id).await?;
    if id == auth.user_id {
        return Err(AppError::BadRequest(
            "Cannot delete your own account".into(),
        ));
    }
    let deleted = UserRepo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }
    tracing::info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/admin/users/{id}/permissions
///
/// Replace a reviewer's per-section grants. A `null` body clears the map,
/// returning the admin to unrestricted access.
pub async fn set_permissions(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(permissions): Json<Option<StagePermissionsMap>>,
) -> AppResult<Json<UserResponse>> {
    require_user_manager(&state, auth.user_id).await?;

    let target = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    if !is_admin_role(&target.role) {
        return Err(AppError::Core(CoreError::Validation(
            "Stage permissions only apply to admin accounts".into(),
        )));
    }

    UserRepo::set_stage_permissions(&state.pool, id, permissions.as_ref()).await?;
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    Ok(Json(UserResponse::from(user)))
}

/// POST /api/v1/admin/users/{id}/reset-password
///
/// Set a new password and revoke the target's sessions so old refresh
/// tokens stop working immediately.
pub async fn reset_password(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    require_user_manager(&state, auth.user_id).await?;

    validate_password_strength(&input.new_password).map_err(AppError::BadRequest)?;
    let password_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let updated = UserRepo::set_password_hash(&state.pool, id, &password_hash).await?;
    if !updated {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/metrics
pub async fn metrics(
    RequireAdmin(_auth): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DashboardMetrics>> {
    let metrics = DashboardRepo::metrics(&state.pool).await?;
    Ok(Json(metrics))
}
