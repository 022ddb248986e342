//! Salon Settings Routes
//!
//! - GET /api/v1/settings - Published salon info (public)
//! - PUT /api/v1/settings - Publish changes (admin, merge)

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::AdminUser;
use crate::api::state::AppState;
use crate::dashboard::validate_settings;
use crate::storage::{SalonSettings, SalonSettingsUpdate};
use crate::websocket::WsEvent;

/// GET /api/v1/settings
///
/// Returns an empty document until the first publish.
pub async fn get_settings(State(state): State<Arc<AppState>>) -> ApiResult<Json<SalonSettings>> {
    Ok(Json(state.store.salon_settings()?))
}

/// PUT /api/v1/settings
///
/// Merges the given fields, re-derives the address line and stamps
/// `last_update`.
pub async fn publish_settings(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(update): Json<SalonSettingsUpdate>,
) -> ApiResult<Json<SalonSettings>> {
    let mut settings = state.store.salon_settings()?;
    validate_settings(&settings, &update).map_err(ApiError::Validation)?;

    settings.merge(update, Utc::now());
    state.store.save_salon_settings(&settings)?;

    tracing::info!(admin_id = %admin.id, address = %settings.address, "Salon info published");
    state.ws_hub.publish([WsEvent::settings(&settings)]).await;

    Ok(Json(settings))
}
