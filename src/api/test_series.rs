//! Daily test series API endpoints.
//!
//! Read-only: the backend contract exposes no test-series write operations,
//! so rows are managed out of band.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::daykey::DayKey;
use crate::models::DailyTestSeriesEntry;
use crate::AppState;

/// Optional filters for the test-series listing.
#[derive(Debug, Deserialize)]
pub struct TestSeriesListQuery {
    pub day: Option<DayKey>,
    pub subject: Option<String>,
}

/// GET /api/daily-test-series - List test series entries, optionally filtered
/// by day key or subject key.
pub async fn list_daily_test_series(
    State(state): State<AppState>,
    Query(params): Query<TestSeriesListQuery>,
) -> ApiResult<Vec<DailyTestSeriesEntry>> {
    let entries = match (params.day, &params.subject) {
        (Some(day), _) => state.repo.daily_test_series_by_day(day).await?,
        (None, Some(subject)) => state.repo.daily_test_series_by_subject(subject).await?,
        (None, None) => state.repo.list_daily_test_series().await?,
    };

    success(entries)
}
