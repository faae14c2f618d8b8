//! Previous-year paper model matching the frontend PreviousYearPaper interface.

use serde::{Deserialize, Serialize};

/// Lowest year accepted for a previous-year paper.
pub const MIN_PAPER_YEAR: i64 = 2000;
/// Highest year accepted for a previous-year paper.
pub const MAX_PAPER_YEAR: i64 = 2100;

/// A question paper from an earlier exam sitting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreviousYearPaper {
    pub id: i64,
    pub year: i64,
    pub subject: String,
    /// Composite subject key, e.g. `gpsc-gujarati`. Opaque match key.
    pub exam_name: String,
    pub url: String,
}

/// Request body for adding a previous-year paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePreviousYearPaperRequest {
    pub year: i64,
    pub subject: String,
    pub exam_name: String,
    pub url: String,
}
