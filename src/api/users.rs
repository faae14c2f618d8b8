//! Identity API endpoints: caller profile, role lookups, role assignment.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use super::{success, ApiResult};
use crate::auth;
use crate::errors::AppError;
use crate::models::{AssignRoleRequest, UserProfile, UserRole};
use crate::AppState;

/// GET /api/me/profile - Profile of the calling principal, null when absent.
pub async fn get_caller_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Option<UserProfile>> {
    let profile = match auth::caller_principal(&headers) {
        Some(principal) => state.repo.get_user_profile(&principal).await?,
        None => None,
    };

    success(profile)
}

/// PUT /api/me/profile - Save the calling principal's own profile.
pub async fn save_caller_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(profile): Json<UserProfile>,
) -> ApiResult<UserProfile> {
    let principal = auth::require_caller(&headers)?;

    if profile.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    state.repo.save_user_profile(&principal, &profile).await?;
    success(profile)
}

/// GET /api/me/role - Role of the calling principal; guests when anonymous.
pub async fn get_caller_role(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<UserRole> {
    let principal = auth::caller_principal(&headers);
    let role = auth::resolve_role(&state, principal.as_deref()).await?;
    success(role)
}

/// GET /api/me/is-admin - Whether the calling principal holds the admin role.
pub async fn is_caller_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<bool> {
    let principal = auth::caller_principal(&headers);
    let role = auth::resolve_role(&state, principal.as_deref()).await?;
    success(role == UserRole::Admin)
}

/// GET /api/users/:principal/profile - Profile stored for a principal.
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(principal): Path<String>,
) -> ApiResult<Option<UserProfile>> {
    let profile = state.repo.get_user_profile(&principal).await?;
    success(profile)
}

/// PUT /api/users/:principal/role - Assign a role to a principal (admin only).
pub async fn assign_user_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(principal): Path<String>,
    Json(request): Json<AssignRoleRequest>,
) -> ApiResult<()> {
    let caller = auth::require_admin(&state, &headers).await?;

    if principal.trim().is_empty() {
        return Err(AppError::Validation("Principal is required".to_string()));
    }

    state.repo.assign_user_role(&principal, request.role).await?;
    tracing::info!(%principal, role = request.role.as_str(), by = %caller, "role assigned");
    success(())
}
