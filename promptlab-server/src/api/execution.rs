//! Execution API Handlers
//!
//! HTTP endpoints for single-template runs and execution history.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use promptlab_core::domain::execution::{PipelineExecution, TemplateExecution};
use promptlab_core::dto::Pagination;
use promptlab_core::dto::execution::ExecuteTemplate;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::service::execution_service::{self, ExecutionError};
use crate::state::AppState;

pub(crate) fn execution_api_error(err: ExecutionError) -> ApiError {
    match err {
        ExecutionError::NotFound(id) => ApiError::NotFound(format!("Execution {} not found", id)),
        ExecutionError::PipelineNotFound(id) => {
            ApiError::NotFound(format!("Pipeline {} not found", id))
        }
        ExecutionError::TemplateNotFound(id) => {
            ApiError::NotFound(format!("Template {} not found", id))
        }
        ExecutionError::InvalidDefinition(msg) => ApiError::Unprocessable(msg),
        ExecutionError::ValidationError(msg) => ApiError::BadRequest(msg),
        ExecutionError::StoreError(msg) | ExecutionError::Internal(msg) => {
            ApiError::InternalError(msg)
        }
        ExecutionError::DatabaseError(err) => ApiError::DatabaseError(err),
    }
}

/// POST /api/executions
/// Run a single template once
pub async fn execute_template(
    State(state): State<AppState>,
    Json(req): Json<ExecuteTemplate>,
) -> ApiResult<(StatusCode, Json<TemplateExecution>)> {
    tracing::info!(
        "Executing template {} on {}/{}",
        req.template_id,
        req.provider,
        req.model
    );

    let execution = execution_service::execute_template(&state.engine, req)
        .await
        .map_err(execution_api_error)?;

    Ok((StatusCode::CREATED, Json(execution)))
}

/// GET /api/executions
/// List single-template executions, newest first
pub async fn list_template_executions(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<TemplateExecution>>> {
    tracing::debug!("Listing template executions");

    let executions = execution_service::list_template_executions(state.executions.as_ref(), page)
        .await
        .map_err(execution_api_error)?;

    Ok(Json(executions))
}

/// GET /api/executions/{id}
pub async fn get_template_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TemplateExecution>> {
    tracing::debug!("Getting template execution: {}", id);

    let execution = execution_service::get_template_execution(state.executions.as_ref(), id)
        .await
        .map_err(execution_api_error)?;

    Ok(Json(execution))
}

/// GET /api/pipeline-executions
/// List pipeline executions across all pipelines, newest first
pub async fn list_pipeline_executions(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<PipelineExecution>>> {
    tracing::debug!("Listing pipeline executions");

    let executions =
        execution_service::list_all_pipeline_executions(state.executions.as_ref(), page)
            .await
            .map_err(execution_api_error)?;

    Ok(Json(executions))
}

/// GET /api/pipeline-executions/{id}
pub async fn get_pipeline_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PipelineExecution>> {
    tracing::debug!("Getting pipeline execution: {}", id);

    let execution = execution_service::get_pipeline_execution(state.executions.as_ref(), id)
        .await
        .map_err(execution_api_error)?;

    Ok(Json(execution))
}
