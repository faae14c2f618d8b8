//! Daily pollution bulletin API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::auth;
use crate::daykey::DayKey;
use crate::errors::AppError;
use crate::models::{CreateDailyPollutionRequest, DailyPollutionEntry};
use crate::AppState;

/// Optional filter for the pollution listing.
#[derive(Debug, Deserialize)]
pub struct PollutionListQuery {
    pub day: Option<DayKey>,
}

/// GET /api/daily-pollution - List pollution bulletins, optionally for one day.
pub async fn list_daily_pollution(
    State(state): State<AppState>,
    Query(params): Query<PollutionListQuery>,
) -> ApiResult<Vec<DailyPollutionEntry>> {
    let entries = match params.day {
        Some(day) => state.repo.daily_pollution_by_day(day).await?,
        None => state.repo.list_daily_pollution_entries().await?,
    };

    success(entries)
}

/// POST /api/daily-pollution - Add a pollution bulletin (admin only).
pub async fn add_daily_pollution(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateDailyPollutionRequest>,
) -> ApiResult<DailyPollutionEntry> {
    auth::require_admin(&state, &headers).await?;

    // Validate required fields
    if request.air_quality.trim().is_empty() {
        return Err(AppError::Validation("Air quality is required".to_string()));
    }
    if request.pollution_source.trim().is_empty() {
        return Err(AppError::Validation(
            "Pollution source is required".to_string(),
        ));
    }
    if request.recommendations.trim().is_empty() {
        return Err(AppError::Validation(
            "Recommendations are required".to_string(),
        ));
    }

    let entry = state.repo.add_daily_pollution_entry(&request).await?;
    tracing::info!(id = entry.id, day = entry.day, "pollution bulletin added");
    success(entry)
}

/// DELETE /api/daily-pollution/:id - Delete a pollution bulletin (admin only).
pub async fn delete_daily_pollution(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    auth::require_admin(&state, &headers).await?;

    state.repo.delete_daily_pollution_entry(id).await?;
    tracing::info!(id, "pollution bulletin deleted");
    success(())
}
