//! API Module
//!
//! HTTP API layer of the server.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod execution;
pub mod health;
pub mod pipeline;
pub mod provider;
pub mod template;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Template endpoints
        .route(
            "/api/templates",
            get(template::list_templates).post(template::create_template),
        )
        .route(
            "/api/templates/{id}",
            get(template::get_template)
                .put(template::update_template)
                .delete(template::delete_template),
        )
        .route("/api/templates/{id}/versions", get(template::list_versions))
        .route("/api/templates/{id}/variables", get(template::get_variables))
        // Pipeline endpoints
        .route(
            "/api/pipelines",
            get(pipeline::list_pipelines).post(pipeline::create_pipeline),
        )
        .route(
            "/api/pipelines/{id}",
            get(pipeline::get_pipeline)
                .put(pipeline::update_pipeline)
                .delete(pipeline::delete_pipeline),
        )
        .route("/api/pipelines/{id}/execute", post(pipeline::execute_pipeline))
        .route("/api/pipelines/{id}/executions", get(pipeline::list_executions))
        // Execution history endpoints
        .route(
            "/api/pipeline-executions",
            get(execution::list_pipeline_executions),
        )
        .route(
            "/api/pipeline-executions/{id}",
            get(execution::get_pipeline_execution),
        )
        .route(
            "/api/executions",
            get(execution::list_template_executions).post(execution::execute_template),
        )
        .route("/api/executions/{id}", get(execution::get_template_execution))
        // Provider endpoints
        .route("/api/providers", get(provider::list_providers))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
