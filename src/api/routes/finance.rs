//! Finance Routes
//!
//! - GET /api/v1/finance/summary?year=&month= - Monthly revenue summary (admin)

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::FinanceParams;
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::AdminUser;
use crate::api::state::AppState;
use crate::finance::{monthly_summary, Month, MonthlySummary};
use crate::storage::DEFAULT_MONTHLY_GOAL;

/// GET /api/v1/finance/summary
///
/// Defaults to the current month in the salon offset. Progress is measured
/// against the calling administrator's monthly goal.
pub async fn summary(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Query(params): Query<FinanceParams>,
) -> ApiResult<Json<MonthlySummary>> {
    let current = Month::current(state.config.salon_offset);
    let month = Month::new(
        params.year.unwrap_or(current.year),
        params.month.unwrap_or(current.month),
    )
    .ok_or_else(|| ApiError::Validation("Month must be between 1 and 12".to_string()))?;

    let goal = state
        .store
        .get_user(&admin.id)?
        .map(|p| p.monthly_goal)
        .unwrap_or(DEFAULT_MONTHLY_GOAL);

    let appointments = state.store.list_appointments()?;
    Ok(Json(monthly_summary(
        &appointments,
        month,
        goal,
        state.config.salon_offset,
    )))
}
