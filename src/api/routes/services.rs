//! Service Catalog Routes
//!
//! - GET /api/v1/services - List (name order) with optional search
//! - GET /api/v1/services/stats - Catalog counters
//! - POST /api/v1/services - Create (admin)
//! - PUT /api/v1/services/:id - Update (admin)
//! - DELETE /api/v1/services/:id - Delete (admin)
//! - POST /api/v1/services/seed - Insert the default catalog if empty (admin)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{SeedResponse, ServiceListParams, ServiceListResponse, ServiceRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::AdminUser;
use crate::api::state::AppState;
use crate::dashboard::{search_services, validate_service, ServiceStats};
use crate::storage::{default_services, Service, ServiceDraft};
use crate::websocket::{ChangeKind, WsEvent};

fn draft_from(req: ServiceRequest) -> ApiResult<ServiceDraft> {
    let draft = ServiceDraft::new(req.name.trim(), req.price, req.duration);
    validate_service(&draft).map_err(ApiError::Validation)?;
    Ok(draft)
}

/// GET /api/v1/services
///
/// Public: the booking screens read the catalog before sign-in.
/// Stats always describe the whole catalog, not the search result.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ServiceListParams>,
) -> ApiResult<Json<ServiceListResponse>> {
    let services = state.store.list_services()?;
    let stats = ServiceStats::compute(&services);

    Ok(Json(ServiceListResponse {
        services: search_services(services, params.search.as_deref()),
        stats,
    }))
}

/// GET /api/v1/services/stats
pub async fn service_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<ServiceStats>> {
    let services = state.store.list_services()?;
    Ok(Json(ServiceStats::compute(&services)))
}

/// POST /api/v1/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<ServiceRequest>,
) -> ApiResult<(StatusCode, Json<Service>)> {
    let service = state.store.create_service(&draft_from(req)?)?;

    tracing::info!(service_id = %service.id, name = %service.name, "Service created");
    state
        .ws_hub
        .publish([WsEvent::service(ChangeKind::Created, &service)])
        .await;

    Ok((StatusCode::CREATED, Json(service)))
}

/// PUT /api/v1/services/:id
///
/// Existing appointments keep the name and price copied at booking time.
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<ServiceRequest>,
) -> ApiResult<Json<Service>> {
    let service = state.store.update_service(&id, &draft_from(req)?)?;

    tracing::info!(service_id = %id, "Service updated");
    state
        .ws_hub
        .publish([WsEvent::service(ChangeKind::Updated, &service)])
        .await;

    Ok(Json(service))
}

/// DELETE /api/v1/services/:id
///
/// Appointments referencing the service are not touched.
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete_service(&id)?;

    tracing::info!(service_id = %id, "Service deleted");
    state.ws_hub.publish([WsEvent::service_deleted(&id)]).await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/services/seed
pub async fn seed_services(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
) -> ApiResult<Json<SeedResponse>> {
    let inserted = state.store.seed_services(&default_services())?;

    if inserted.is_empty() {
        tracing::info!(admin_id = %admin.id, "Catalog already populated, seed skipped");
    } else {
        tracing::info!(admin_id = %admin.id, count = inserted.len(), "Default catalog seeded");
        state
            .ws_hub
            .publish(
                inserted
                    .iter()
                    .map(|s| WsEvent::service(ChangeKind::Created, s))
                    .collect::<Vec<_>>(),
            )
            .await;
    }

    Ok(Json(SeedResponse {
        seeded: !inserted.is_empty(),
        inserted: inserted.len(),
    }))
}
