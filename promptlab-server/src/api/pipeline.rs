//! Pipeline API Handlers
//!
//! HTTP endpoints for pipeline management and execution.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use promptlab_core::domain::execution::PipelineExecution;
use promptlab_core::domain::pipeline::Pipeline;
use promptlab_core::dto::Pagination;
use promptlab_core::dto::pipeline::{CreatePipeline, ExecutePipeline, UpdatePipeline};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::execution::execution_api_error;
use crate::service::execution_service;
use crate::service::pipeline_service::{self, PipelineError};
use crate::state::AppState;

fn into_api_error(err: PipelineError) -> ApiError {
    match err {
        PipelineError::NotFound(id) => ApiError::NotFound(format!("Pipeline {} not found", id)),
        PipelineError::ValidationError(msg) => ApiError::BadRequest(msg),
        PipelineError::DatabaseError(err) => ApiError::DatabaseError(err),
    }
}

/// POST /api/pipelines
/// Create a new pipeline
pub async fn create_pipeline(
    State(state): State<AppState>,
    Json(req): Json<CreatePipeline>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    tracing::info!("Creating pipeline: {} ({} steps)", req.name, req.steps.len());

    let pipeline = pipeline_service::create_pipeline(&state.pool, state.gateway.as_ref(), req)
        .await
        .map_err(into_api_error)?;

    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// GET /api/pipelines
/// List pipelines
pub async fn list_pipelines(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Pipeline>>> {
    tracing::debug!("Listing pipelines (skip={}, limit={})", page.skip, page.limit);

    let pipelines = pipeline_service::list_pipelines(&state.pool, page)
        .await
        .map_err(into_api_error)?;

    Ok(Json(pipelines))
}

/// GET /api/pipelines/{id}
/// Get pipeline by ID
pub async fn get_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Pipeline>> {
    tracing::debug!("Getting pipeline: {}", id);

    let pipeline = pipeline_service::get_pipeline(&state.pool, id)
        .await
        .map_err(into_api_error)?;

    Ok(Json(pipeline))
}

/// PUT /api/pipelines/{id}
/// Update a pipeline
pub async fn update_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePipeline>,
) -> ApiResult<Json<Pipeline>> {
    tracing::info!("Updating pipeline: {}", id);

    let pipeline = pipeline_service::update_pipeline(&state.pool, state.gateway.as_ref(), id, req)
        .await
        .map_err(into_api_error)?;

    Ok(Json(pipeline))
}

/// DELETE /api/pipelines/{id}
/// Delete a pipeline
pub async fn delete_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting pipeline: {}", id);

    pipeline_service::delete_pipeline(&state.pool, id)
        .await
        .map_err(into_api_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/pipelines/{id}/execute
/// Run a pipeline; a run that fails is still reported as created
pub async fn execute_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ExecutePipeline>,
) -> ApiResult<(StatusCode, Json<PipelineExecution>)> {
    tracing::info!(
        "Executing pipeline {} with {} input variables",
        id,
        req.variables.len()
    );

    let execution = execution_service::execute_pipeline(&state.pool, &state.engine, id, req)
        .await
        .map_err(execution_api_error)?;

    Ok((StatusCode::CREATED, Json(execution)))
}

/// GET /api/pipelines/{id}/executions
/// Execution history of a pipeline, newest first
pub async fn list_executions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<PipelineExecution>>> {
    tracing::debug!("Listing executions of pipeline: {}", id);

    let executions = execution_service::list_pipeline_executions(
        &state.pool,
        state.executions.as_ref(),
        id,
        page,
    )
    .await
    .map_err(execution_api_error)?;

    Ok(Json(executions))
}
