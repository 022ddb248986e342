//! Auth Routes
//!
//! - POST /api/v1/auth/register - Create a client account
//! - POST /api/v1/auth/login - Sign in (console or client audience)
//! - POST /api/v1/auth/logout - End the current session
//! - POST /api/v1/auth/password-reset - Request a reset token
//! - POST /api/v1/auth/password-reset/confirm - Redeem a reset token
//! - POST /api/v1/auth/change-password - Change password (signed in)

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{
    ChangePasswordRequest, ChangePasswordResponse, LoginResponse, PasswordResetConfirm,
    PasswordResetRequest, RegisterRequest, StatusResponse,
};
use crate::api::error::ApiResult;
use crate::api::extract::{BearerToken, CurrentUser};
use crate::api::state::AppState;
use crate::auth::LoginRequest;
use crate::storage::UserProfile;
use crate::websocket::WsEvent;

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let profile = state
        .auth
        .register(&req.email, &req.password, &req.name)
        .await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /api/v1/auth/login
///
/// Console logins are limited to administrators. A successful login
/// re-derives the user's appointment reminders.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (session, profile) = state.auth.login(&req).await?;

    if req.push_token.is_some() {
        state.ws_hub.publish([WsEvent::profile(&profile)]).await;
    }
    state.reminders.resync(&profile.id).await;

    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: profile,
    }))
}

/// POST /api/v1/auth/logout
///
/// Drops the session, closes the user's realtime connections and cancels
/// their reminders.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<StatusResponse>> {
    if let Some(user_id) = state.auth.logout(&token).await {
        state.ws_hub.disconnect_user(&user_id).await;
        let cancelled = state.reminders.cancel_all(&user_id).await;
        tracing::debug!(user_id = %user_id, cancelled, "Reminders cancelled on sign-out");
    }

    Ok(Json(StatusResponse::ok()))
}

/// POST /api/v1/auth/password-reset
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordResetRequest>,
) -> ApiResult<(StatusCode, Json<StatusResponse>)> {
    state.auth.request_password_reset(&req.email).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(StatusResponse::with_message(
            "Password reset instructions were sent",
        )),
    ))
}

/// POST /api/v1/auth/password-reset/confirm
///
/// Signs the user out everywhere, realtime connections included.
pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordResetConfirm>,
) -> ApiResult<Json<StatusResponse>> {
    let user_id = state
        .auth
        .confirm_password_reset(&req.token, &req.new_password)
        .await?;
    state.ws_hub.disconnect_user(&user_id).await;

    Ok(Json(StatusResponse::ok()))
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<ChangePasswordResponse>> {
    let strength = state
        .auth
        .change_password(
            &user.id,
            &req.current_password,
            &req.new_password,
            &req.confirm_password,
        )
        .await?;

    Ok(Json(ChangePasswordResponse {
        status: "ok".to_string(),
        strength,
    }))
}
