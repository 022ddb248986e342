//! Appointment Routes
//!
//! - GET /api/v1/appointments - Board listing with filter and search (admin)
//! - GET /api/v1/appointments/stats - Board counters (admin)
//! - GET /api/v1/appointments/mine - The caller's appointments
//! - POST /api/v1/appointments - Book an appointment
//! - PUT /api/v1/appointments/:id/status - Change status (admin)
//! - DELETE /api/v1/appointments/:id - Delete (admin)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::api::dto::{
    AppointmentListParams, AppointmentListResponse, BookAppointmentRequest, UpdateStatusRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{AdminUser, CurrentUser};
use crate::api::state::AppState;
use crate::dashboard::{filter_appointments, AppointmentStats};
use crate::push::PushMessage;
use crate::storage::{Appointment, AppointmentFilter, AppointmentStatus, NewAppointment};
use crate::websocket::{ChangeKind, WsEvent};

/// GET /api/v1/appointments
///
/// Newest date first. `filter` defaults to `all`.
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<AppointmentListParams>,
) -> ApiResult<Json<AppointmentListResponse>> {
    let filter = match params.filter.as_deref() {
        Some(raw) => AppointmentFilter::parse(raw)
            .ok_or_else(|| ApiError::Validation(format!("Unknown filter: {}", raw)))?,
        None => AppointmentFilter::All,
    };

    let appointments = filter_appointments(
        state.store.list_appointments()?,
        filter,
        params.search.as_deref(),
        Utc::now(),
        state.config.salon_offset,
    );

    Ok(Json(AppointmentListResponse {
        total: appointments.len(),
        appointments,
    }))
}

/// GET /api/v1/appointments/stats
pub async fn appointment_stats(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> ApiResult<Json<AppointmentStats>> {
    let appointments = state.store.list_appointments()?;
    Ok(Json(AppointmentStats::compute(
        &appointments,
        Utc::now(),
        state.config.salon_offset,
    )))
}

/// GET /api/v1/appointments/mine
pub async fn my_appointments(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<AppointmentListResponse>> {
    let appointments = state.store.appointments_for_user(&user.id)?;
    Ok(Json(AppointmentListResponse {
        total: appointments.len(),
        appointments,
    }))
}

/// POST /api/v1/appointments
///
/// Books a pending appointment for the caller, copying the service's
/// name and price, then re-derives the caller's reminders.
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<BookAppointmentRequest>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    if req.date <= Utc::now() {
        return Err(ApiError::Validation(
            "Appointment date must be in the future".to_string(),
        ));
    }

    let service = state
        .store
        .get_service(&req.service_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Service {}", req.service_id)))?;

    let appointment = state.store.create_appointment(NewAppointment {
        user_id: user.id.clone(),
        user_name: Some(user.name.clone()),
        service_id: service.id,
        service_name: service.name,
        price: service.price,
        professional: state.config.professional.clone(),
        date: req.date,
    })?;

    tracing::info!(
        appointment_id = %appointment.id,
        user_id = %user.id,
        service = %appointment.service_name,
        "Appointment booked"
    );

    state
        .ws_hub
        .publish(WsEvent::appointment(ChangeKind::Created, &appointment))
        .await;
    state.reminders.resync(&user.id).await;

    Ok((StatusCode::CREATED, Json(appointment)))
}

/// PUT /api/v1/appointments/:id/status
///
/// Any status may follow any other. Confirming notifies the client.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Appointment>> {
    let appointment = state.store.update_appointment_status(&id, req.status)?;

    tracing::info!(
        appointment_id = %id,
        status = %req.status,
        admin_id = %admin.id,
        "Appointment status changed"
    );

    state
        .ws_hub
        .publish(WsEvent::appointment(ChangeKind::Updated, &appointment))
        .await;

    if req.status == AppointmentStatus::Confirmed {
        notify_confirmed(&state, &appointment).await;
    }

    Ok(Json(appointment))
}

/// Tell the client their appointment was approved; failures are only logged
async fn notify_confirmed(state: &AppState, appointment: &Appointment) {
    let token = match state.store.get_user(&appointment.user_id) {
        Ok(Some(profile)) => profile.push_token,
        Ok(None) => None,
        Err(e) => {
            tracing::error!(user_id = %appointment.user_id, error = %e, "Failed to load client for notification");
            return;
        }
    };

    let Some(token) = token else {
        tracing::debug!(user_id = %appointment.user_id, "Client has no push token");
        return;
    };

    let message = PushMessage::new(
        token,
        "Confirmed! ✅",
        format!(
            "Your appointment for {} was approved.",
            appointment.service_name
        ),
    )
    .data(json!({ "screen": "appointments" }));

    if let Err(e) = state.push.send(&message).await {
        tracing::error!(
            appointment_id = %appointment.id,
            error = %e,
            "Failed to send confirmation notification"
        );
    }
}

/// DELETE /api/v1/appointments/:id
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let appointment = state
        .store
        .get_appointment(&id)?
        .ok_or_else(|| ApiError::NotFound(format!("Appointment {}", id)))?;

    state.store.delete_appointment(&id)?;
    tracing::info!(appointment_id = %id, admin_id = %admin.id, "Appointment deleted");

    state
        .ws_hub
        .publish(WsEvent::appointment_deleted(&appointment))
        .await;
    state.reminders.resync(&appointment.user_id).await;

    Ok(StatusCode::NO_CONTENT)
}
