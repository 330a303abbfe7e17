//! Execution Service
//!
//! Runs pipelines and templates through the engine and reads execution
//! history back from the execution store.

use promptlab_core::domain::execution::{PipelineExecution, TemplateExecution};
use promptlab_core::domain::pipeline::{DefinitionError, check_provider_model};
use promptlab_core::dto::Pagination;
use promptlab_core::dto::execution::ExecuteTemplate;
use promptlab_core::dto::pipeline::ExecutePipeline;
use promptlab_engine::{EngineError, ExecutionStore, PipelineEngine, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::pipeline_repository;

/// Service error type
#[derive(Debug)]
pub enum ExecutionError {
    NotFound(Uuid),
    PipelineNotFound(Uuid),
    TemplateNotFound(Uuid),
    /// The stored definition cannot run; nothing was executed or saved
    InvalidDefinition(String),
    ValidationError(String),
    /// The run could not be loaded or saved
    StoreError(String),
    /// The engine broke one of its own invariants
    Internal(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for ExecutionError {
    fn from(err: sqlx::Error) -> Self {
        ExecutionError::DatabaseError(err)
    }
}

impl From<StoreError> for ExecutionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, .. } => ExecutionError::NotFound(id),
            other => ExecutionError::StoreError(other.to_string()),
        }
    }
}

impl From<EngineError> for ExecutionError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Definition(DefinitionError::TemplateNotFound(id)) => {
                ExecutionError::TemplateNotFound(id)
            }
            EngineError::Definition(e) => ExecutionError::InvalidDefinition(e.to_string()),
            EngineError::InvalidTransition(e) => ExecutionError::Internal(e.to_string()),
            other => ExecutionError::StoreError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Execute a stored pipeline
///
/// A run whose steps fail still returns `Ok` with a `failed` record.
pub async fn execute_pipeline(
    pool: &PgPool,
    engine: &PipelineEngine,
    pipeline_id: Uuid,
    req: ExecutePipeline,
) -> Result<PipelineExecution> {
    let pipeline = pipeline_repository::find_by_id(pool, pipeline_id)
        .await?
        .ok_or(ExecutionError::PipelineNotFound(pipeline_id))?;

    let execution = engine
        .execute(&pipeline, req.variables)
        .await
        .map_err(|e| match e {
            // A step template vanished after the pipeline was saved
            EngineError::Definition(DefinitionError::TemplateNotFound(id)) => {
                ExecutionError::InvalidDefinition(format!("Template {} not found", id))
            }
            other => other.into(),
        })?;

    tracing::info!(
        "Pipeline {} executed: {} ({})",
        pipeline_id,
        execution.id,
        execution.status
    );

    Ok(execution)
}

/// Execute a single template once
pub async fn execute_template(
    engine: &PipelineEngine,
    req: ExecuteTemplate,
) -> Result<TemplateExecution> {
    // Must hold before the provider is called; the record columns are bounded
    check_provider_model(&req.provider, &req.model).map_err(ExecutionError::ValidationError)?;

    let execution = engine
        .execute_template(req.template_id, &req.provider, &req.model, req.variables)
        .await?;

    tracing::info!(
        "Template {} executed: {} ({})",
        req.template_id,
        execution.id,
        execution.status
    );

    Ok(execution)
}

/// Execution history of one pipeline
pub async fn list_pipeline_executions(
    pool: &PgPool,
    store: &dyn ExecutionStore,
    pipeline_id: Uuid,
    page: Pagination,
) -> Result<Vec<PipelineExecution>> {
    page.validate().map_err(ExecutionError::ValidationError)?;

    if !pipeline_repository::exists(pool, pipeline_id).await? {
        return Err(ExecutionError::PipelineNotFound(pipeline_id));
    }

    let executions = store.list(Some(pipeline_id), page).await?;
    Ok(executions)
}

/// Execution history of all pipelines
pub async fn list_all_pipeline_executions(
    store: &dyn ExecutionStore,
    page: Pagination,
) -> Result<Vec<PipelineExecution>> {
    page.validate().map_err(ExecutionError::ValidationError)?;
    let executions = store.list(None, page).await?;
    Ok(executions)
}

pub async fn get_pipeline_execution(
    store: &dyn ExecutionStore,
    id: Uuid,
) -> Result<PipelineExecution> {
    let execution = store.get(id).await?;
    Ok(execution)
}

pub async fn list_template_executions(
    store: &dyn ExecutionStore,
    page: Pagination,
) -> Result<Vec<TemplateExecution>> {
    page.validate().map_err(ExecutionError::ValidationError)?;
    let executions = store.list_template_executions(page).await?;
    Ok(executions)
}

pub async fn get_template_execution(
    store: &dyn ExecutionStore,
    id: Uuid,
) -> Result<TemplateExecution> {
    let execution = store.get_template_execution(id).await?;
    Ok(execution)
}
