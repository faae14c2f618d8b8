//! Previous-year paper API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::auth;
use crate::errors::AppError;
use crate::models::{
    CreatePreviousYearPaperRequest, PreviousYearPaper, MAX_PAPER_YEAR, MIN_PAPER_YEAR,
};
use crate::AppState;

/// Optional filters for the paper listing.
#[derive(Debug, Deserialize)]
pub struct PaperListQuery {
    pub subject: Option<String>,
    pub exam: Option<String>,
}

/// GET /api/previous-year-papers - List papers, optionally filtered by subject
/// or exam-name key.
pub async fn list_previous_year_papers(
    State(state): State<AppState>,
    Query(params): Query<PaperListQuery>,
) -> ApiResult<Vec<PreviousYearPaper>> {
    let papers = match (&params.subject, &params.exam) {
        (Some(subject), _) => state.repo.previous_year_papers_by_subject(subject).await?,
        (None, Some(exam)) => state.repo.previous_year_papers_by_exam(exam).await?,
        (None, None) => state.repo.list_previous_year_papers().await?,
    };

    success(papers)
}

/// GET /api/previous-year-papers/:id - Get a single paper.
pub async fn get_previous_year_paper(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<PreviousYearPaper> {
    match state.repo.get_previous_year_paper(id).await? {
        Some(paper) => success(paper),
        None => Err(AppError::NotFound(format!(
            "Previous year paper {} not found",
            id
        ))),
    }
}

/// POST /api/previous-year-papers - Add a paper (admin only).
pub async fn add_previous_year_paper(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreatePreviousYearPaperRequest>,
) -> ApiResult<PreviousYearPaper> {
    auth::require_admin(&state, &headers).await?;

    // Validate required fields
    if request.subject.trim().is_empty() {
        return Err(AppError::Validation("Subject is required".to_string()));
    }
    if request.exam_name.trim().is_empty() {
        return Err(AppError::Validation("Exam name is required".to_string()));
    }
    if request.year < MIN_PAPER_YEAR || request.year > MAX_PAPER_YEAR {
        return Err(AppError::Validation(format!(
            "Year must be between {} and {}",
            MIN_PAPER_YEAR, MAX_PAPER_YEAR
        )));
    }

    let paper = state.repo.add_previous_year_paper(&request).await?;
    tracing::info!(id = paper.id, exam = %paper.exam_name, "previous year paper added");
    success(paper)
}

/// DELETE /api/previous-year-papers/:id - Delete a paper (admin only).
pub async fn delete_previous_year_paper(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    auth::require_admin(&state, &headers).await?;

    state.repo.delete_previous_year_paper(id).await?;
    tracing::info!(id, "previous year paper deleted");
    success(())
}
