//! Authentication and authorization.
//!
//! Two layers: an optional pre-shared key authenticating the frontend
//! deployment (constant-time comparison to mitigate timing attacks), and a
//! per-caller principal forwarded by the identity provider on the
//! `x-principal` header. Roles attached to principals gate the write surface.

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{codes, AppError, ErrorDetails, ErrorResponse};
use crate::models::UserRole;
use crate::AppState;

/// Header name for the service API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header name for the caller's principal, set by the identity layer.
pub const PRINCIPAL_HEADER: &str = "x-principal";

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    // Get the API key from the request header
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match provided {
        Some(provided_key) => {
            // Constant-time comparison to prevent timing attacks
            if constant_time_compare(&provided_key, &expected) {
                next.run(request).await
            } else {
                unauthorized_response(codes::INVALID_PSK, "Invalid API key")
            }
        }
        None => {
            // Also check Authorization header as bearer token
            let bearer = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|s| s.to_string());

            match bearer {
                Some(bearer_key) if constant_time_compare(&bearer_key, &expected) => {
                    next.run(request).await
                }
                _ => unauthorized_response(codes::UNAUTHORIZED, "Missing or invalid API key"),
            }
        }
    }
}

/// Extract the caller's principal from the request headers, if any.
pub fn caller_principal(headers: &HeaderMap) -> Option<String> {
    headers
        .get(PRINCIPAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

/// Resolve the role of a caller.
///
/// Anonymous callers are guests; authenticated callers without a stored role
/// default to plain users.
pub async fn resolve_role(
    state: &AppState,
    principal: Option<&str>,
) -> Result<UserRole, AppError> {
    match principal {
        None => Ok(UserRole::Guest),
        Some(p) => Ok(state.repo.get_user_role(p).await?.unwrap_or(UserRole::User)),
    }
}

/// Require an authenticated caller with the admin role.
///
/// Returns the caller's principal on success.
pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<String, AppError> {
    let principal = caller_principal(headers)
        .ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()))?;

    let role = resolve_role(state, Some(&principal)).await?;
    if role != UserRole::Admin {
        return Err(AppError::Unauthorized(
            "Admin role required for this operation".to_string(),
        ));
    }

    Ok(principal)
}

/// Require any authenticated caller and return their principal.
pub fn require_caller(headers: &HeaderMap) -> Result<String, AppError> {
    caller_principal(headers).ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()))
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // Constant-time comparison
    a_bytes.ct_eq(b_bytes).into()
}

/// Create an unauthorized response.
fn unauthorized_response(code: &str, message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: code.to_string(),
            message: message.to_string(),
        },
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
