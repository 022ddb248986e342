//! Reminder Routes
//!
//! - GET /api/v1/reminders - The caller's scheduled reminders
//! - POST /api/v1/reminders/resync - Re-derive the caller's reminders

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::RemindersResponse;
use crate::api::error::ApiResult;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;

/// GET /api/v1/reminders
pub async fn list_reminders(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<RemindersResponse>> {
    Ok(Json(RemindersResponse {
        reminders: state.reminders.scheduled(&user.id).await,
    }))
}

/// POST /api/v1/reminders/resync
pub async fn resync_reminders(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<RemindersResponse>> {
    state.reminders.resync(&user.id).await;
    Ok(Json(RemindersResponse {
        reminders: state.reminders.scheduled(&user.id).await,
    }))
}
