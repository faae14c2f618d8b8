//! Exam Prep Content Hub backend.
//!
//! A REST content service with SQLite persistence, plus a typed consumer
//! client with an explicit query cache and admin authorization gate.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod daykey;
pub mod db;
pub mod errors;
pub mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Study materials
        .route("/study-materials", get(api::list_study_materials))
        .route("/study-materials", post(api::add_study_material))
        .route("/study-materials/{id}", get(api::get_study_material))
        .route("/study-materials/{id}", delete(api::delete_study_material))
        // Previous year papers
        .route("/previous-year-papers", get(api::list_previous_year_papers))
        .route("/previous-year-papers", post(api::add_previous_year_paper))
        .route(
            "/previous-year-papers/{id}",
            get(api::get_previous_year_paper),
        )
        .route(
            "/previous-year-papers/{id}",
            delete(api::delete_previous_year_paper),
        )
        // Daily test series (the backend contract exposes no writes)
        .route("/daily-test-series", get(api::list_daily_test_series))
        // Daily pollution bulletins
        .route("/daily-pollution", get(api::list_daily_pollution))
        .route("/daily-pollution", post(api::add_daily_pollution))
        .route("/daily-pollution/{id}", delete(api::delete_daily_pollution))
        // Identity
        .route("/me/profile", get(api::get_caller_profile))
        .route("/me/profile", put(api::save_caller_profile))
        .route("/me/role", get(api::get_caller_role))
        .route("/me/is-admin", get(api::is_caller_admin))
        .route("/users/{principal}/profile", get(api::get_user_profile))
        .route("/users/{principal}/role", put(api::assign_user_role))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
