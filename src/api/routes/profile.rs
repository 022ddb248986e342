//! Profile Routes
//!
//! - GET /api/v1/profile - The caller's profile
//! - PATCH /api/v1/profile/notifications - Partial update of notification flags
//! - PUT /api/v1/profile/goal - Set the monthly revenue goal
//! - PUT /api/v1/profile/push-token - Store or clear the device push token
//! - PUT /api/v1/profile/avatar - Upload a profile picture (raw JPEG body)
//! - GET /api/v1/users/:id/avatar - Download a profile picture

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{AvatarResponse, MonthlyGoalRequest, PushTokenRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::finance::is_valid_goal;
use crate::storage::{BlobStore, NotificationPrefsUpdate, StoreError, UserProfile};
use crate::websocket::WsEvent;

fn load_profile(state: &AppState, user_id: &str) -> ApiResult<UserProfile> {
    state
        .store
        .get_user(user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", user_id)))
}

async fn publish_profile(state: &AppState, profile: &UserProfile) {
    state.ws_hub.publish([WsEvent::profile(profile)]).await;
}

/// GET /api/v1/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(load_profile(&state, &user.id)?))
}

/// PATCH /api/v1/profile/notifications
///
/// Touching the `reminders` flag re-derives (or cancels) the user's reminders.
pub async fn update_notifications(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<NotificationPrefsUpdate>,
) -> ApiResult<Json<UserProfile>> {
    let profile = state.store.update_notifications(&user.id, update)?;
    tracing::info!(user_id = %user.id, prefs = ?profile.notifications, "Notification preferences updated");

    if update.reminders.is_some() {
        state.reminders.resync(&user.id).await;
    }
    publish_profile(&state, &profile).await;

    Ok(Json(profile))
}

/// PUT /api/v1/profile/goal
pub async fn set_monthly_goal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<MonthlyGoalRequest>,
) -> ApiResult<Json<UserProfile>> {
    if !is_valid_goal(req.monthly_goal) {
        return Err(ApiError::Validation(
            "Monthly goal must be greater than zero".to_string(),
        ));
    }

    state.store.set_monthly_goal(&user.id, req.monthly_goal)?;
    let profile = load_profile(&state, &user.id)?;
    publish_profile(&state, &profile).await;

    Ok(Json(profile))
}

/// PUT /api/v1/profile/push-token
pub async fn set_push_token(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<PushTokenRequest>,
) -> ApiResult<Json<UserProfile>> {
    let token = req.push_token.as_deref().filter(|t| !t.trim().is_empty());
    state.store.set_push_token(&user.id, token)?;

    let profile = load_profile(&state, &user.id)?;
    publish_profile(&state, &profile).await;

    Ok(Json(profile))
}

/// PUT /api/v1/profile/avatar
///
/// Stores the body as `avatars/{user_id}.jpg` and records its URL.
pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> ApiResult<Json<AvatarResponse>> {
    if body.is_empty() {
        return Err(ApiError::Validation("Empty image".to_string()));
    }

    state
        .blobs
        .save(&BlobStore::avatar_key(&user.id), &body)
        .await?;

    let url = state.config.avatar_url(&user.id);
    state.store.set_avatar(&user.id, &url)?;

    tracing::info!(user_id = %user.id, bytes = body.len(), "Avatar uploaded");
    publish_profile(&state, &load_profile(&state, &user.id)?).await;

    Ok(Json(AvatarResponse { avatar: url }))
}

/// GET /api/v1/users/:id/avatar
pub async fn get_avatar(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let bytes = match state.blobs.open(&BlobStore::avatar_key(&user_id)).await {
        Ok(bytes) => bytes,
        Err(StoreError::NotFound { .. }) => {
            return Err(ApiError::NotFound(format!("Avatar for {}", user_id)))
        }
        Err(e) => return Err(e.into()),
    };

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}
