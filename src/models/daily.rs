//! Daily-scoped content models: test series entries and pollution bulletins.
//!
//! Both carry a day key (days since the Unix epoch) instead of a full date.

use serde::{Deserialize, Serialize};

use crate::daykey::DayKey;

/// One practice test published for a given day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyTestSeriesEntry {
    pub id: i64,
    pub day: DayKey,
    pub subject: String,
    pub test_name: String,
    pub description: String,
    pub questions_url: String,
    pub video_lecture_url: String,
    pub answers_url: String,
}

/// One air-quality bulletin published for a given day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyPollutionEntry {
    pub id: i64,
    pub day: DayKey,
    pub air_quality: String,
    pub pollution_source: String,
    pub recommendations: String,
}

/// Request body for adding a pollution bulletin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDailyPollutionRequest {
    pub day: DayKey,
    pub air_quality: String,
    pub pollution_source: String,
    pub recommendations: String,
}
