//! Study material API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::auth;
use crate::errors::AppError;
use crate::models::{ContentType, CreateStudyMaterialRequest, StudyMaterial};
use crate::AppState;

/// Optional filters for the material listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialListQuery {
    pub subject: Option<String>,
    pub content_type: Option<String>,
}

/// GET /api/study-materials - List study materials, optionally filtered by
/// subject key or content type.
pub async fn list_study_materials(
    State(state): State<AppState>,
    Query(params): Query<MaterialListQuery>,
) -> ApiResult<Vec<StudyMaterial>> {
    let content_type = parse_content_type(params.content_type.as_deref())?;

    let materials = match (&params.subject, content_type) {
        (Some(subject), filter) => {
            let by_subject = state.repo.study_materials_by_subject(subject).await?;
            match filter {
                // A subject filter may be combined with a content-type filter.
                Some(ct) => by_subject
                    .into_iter()
                    .filter(|m| m.content_type == ct)
                    .collect(),
                None => by_subject,
            }
        }
        (None, Some(ct)) => state.repo.study_materials_by_type(ct).await?,
        (None, None) => state.repo.list_study_materials().await?,
    };

    success(materials)
}

/// GET /api/study-materials/:id - Get a single study material.
pub async fn get_study_material(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StudyMaterial> {
    match state.repo.get_study_material(id).await? {
        Some(material) => success(material),
        None => Err(AppError::NotFound(format!("Study material {} not found", id))),
    }
}

/// POST /api/study-materials - Add a study material (admin only).
pub async fn add_study_material(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateStudyMaterialRequest>,
) -> ApiResult<StudyMaterial> {
    auth::require_admin(&state, &headers).await?;

    // Validate required fields
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if request.subject.trim().is_empty() {
        return Err(AppError::Validation("Subject is required".to_string()));
    }

    let material = state.repo.add_study_material(&request).await?;
    tracing::info!(id = material.id, subject = %material.subject, "study material added");
    success(material)
}

/// DELETE /api/study-materials/:id - Delete a study material (admin only).
pub async fn delete_study_material(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    auth::require_admin(&state, &headers).await?;

    state.repo.delete_study_material(id).await?;
    tracing::info!(id, "study material deleted");
    success(())
}

fn parse_content_type(raw: Option<&str>) -> Result<Option<ContentType>, AppError> {
    match raw {
        None => Ok(None),
        Some(s) => ContentType::from_str(s)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown content type: {}", s))),
    }
}
