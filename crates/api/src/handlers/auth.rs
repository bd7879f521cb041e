//! Handlers for `/auth`: first-run setup, login, token refresh, logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use onboard_core::error::CoreError;
use onboard_core::roles::ROLE_SUPERADMIN;
use onboard_db::models::session::CreateSession;
use onboard_db::models::user::{CreateUser, User, UserResponse};
use onboard_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetupRequest {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair plus the user profile, returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Issue a fresh access/refresh token pair and persist the session.
async fn issue_tokens(state: &AppState, user: &User) -> AppResult<TokenResponse> {
    let access_token = generate_access_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;
    let (refresh_token, refresh_hash) = generate_refresh_token();

    let session = CreateSession {
        user_id: user.id,
        refresh_token_hash: refresh_hash,
        expires_at: Utc::now() + Duration::days(state.config.jwt.refresh_token_expiry_days),
    };
    SessionRepo::create(&state.pool, &session).await?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserResponse::from(user.clone()),
    })
}

/// POST /api/v1/auth/setup
///
/// First-run bootstrap: creates the initial superadmin account. Only
/// available while the user table is empty; afterwards it always rejects.
pub async fn setup(
    State(state): State<AppState>,
    Json(input): Json<SetupRequest>,
) -> AppResult<impl IntoResponse> {
    if UserRepo::count(&state.pool).await? > 0 {
        return Err(AppError::Core(CoreError::Forbidden(
            "Setup has already been completed".into(),
        )));
    }

    validate_password_strength(&input.password).map_err(AppError::BadRequest)?;
    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email: input.email,
            name: input.name,
            password_hash,
            role: ROLE_SUPERADMIN.to_string(),
            can_manage_users: true,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Initial superadmin created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /api/v1/auth/login
///
/// Verify credentials and issue a token pair. Disabled accounts are
/// rejected with 403 even when the password is correct.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Invalid credentials".into())))?;

    if user.disabled {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is disabled".into(),
        )));
    }

    let verified = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?;
    if !verified {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid credentials".into(),
        )));
    }

    let tokens = issue_tokens(&state, &user).await?;
    Ok(Json(tokens))
}

/// POST /api/v1/auth/refresh
///
/// Rotate a refresh token: the presented token's session is revoked and a
/// new pair is issued.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let hash = hash_refresh_token(&input.refresh_token);
    let session = SessionRepo::find_by_refresh_token_hash(&state.pool, &hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;
    if user.disabled {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is disabled".into(),
        )));
    }

    SessionRepo::revoke(&state.pool, session.id).await?;
    let tokens = issue_tokens(&state, &user).await?;
    Ok(Json(tokens))
}

/// POST /api/v1/auth/logout
///
/// Revoke every active session for the authenticated user. Outstanding
/// access tokens keep working until they expire.
pub async fn logout(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth.user_id).await?;
    tracing::debug!(user_id = %auth.user_id, revoked, "Sessions revoked on logout");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<Json<UserResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    Ok(Json(UserResponse::from(user)))
}
