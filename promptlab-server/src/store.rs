//! Postgres-backed engine stores
//!
//! Adapts the repositories to the store traits the engine runs against.

use async_trait::async_trait;
use promptlab_core::domain::execution::{PipelineExecution, TemplateExecution};
use promptlab_core::dto::Pagination;
use promptlab_engine::{ExecutionStore, StoreError, TemplateSnapshot, TemplateStore};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{execution_repository, template_repository};

/// Template content served from the `templates` tables
#[derive(Clone)]
pub struct PgTemplateStore {
    pool: PgPool,
}

impl PgTemplateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn latest_content(&self, template_id: Uuid) -> Result<TemplateSnapshot, StoreError> {
        let template = template_repository::find_by_id(&self.pool, template_id)
            .await
            .map_err(StoreError::backend)?
            .ok_or_else(|| StoreError::template_not_found(template_id))?;

        Ok(TemplateSnapshot {
            template_id,
            name: template.name,
            version_number: template.latest_version.version_number,
            content: template.latest_version.content,
        })
    }
}

/// Execution history stored in Postgres
#[derive(Clone)]
pub struct PgExecutionStore {
    pool: PgPool,
}

impl PgExecutionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionStore for PgExecutionStore {
    async fn save(&self, execution: &PipelineExecution) -> Result<Uuid, StoreError> {
        execution_repository::save_pipeline_execution(&self.pool, execution)
            .await
            .map_err(StoreError::backend)?;
        Ok(execution.id)
    }

    async fn get(&self, id: Uuid) -> Result<PipelineExecution, StoreError> {
        execution_repository::find_pipeline_execution(&self.pool, id)
            .await
            .map_err(StoreError::backend)?
            .ok_or_else(|| StoreError::execution_not_found(id))
    }

    async fn list(
        &self,
        pipeline_id: Option<Uuid>,
        page: Pagination,
    ) -> Result<Vec<PipelineExecution>, StoreError> {
        execution_repository::list_pipeline_executions(&self.pool, pipeline_id, page)
            .await
            .map_err(StoreError::backend)
    }

    async fn save_template_execution(
        &self,
        execution: &TemplateExecution,
    ) -> Result<Uuid, StoreError> {
        execution_repository::save_template_execution(&self.pool, execution)
            .await
            .map_err(StoreError::backend)?;
        Ok(execution.id)
    }

    async fn get_template_execution(&self, id: Uuid) -> Result<TemplateExecution, StoreError> {
        execution_repository::find_template_execution(&self.pool, id)
            .await
            .map_err(StoreError::backend)?
            .ok_or_else(|| StoreError::execution_not_found(id))
    }

    async fn list_template_executions(
        &self,
        page: Pagination,
    ) -> Result<Vec<TemplateExecution>, StoreError> {
        execution_repository::list_template_executions(&self.pool, page)
            .await
            .map_err(StoreError::backend)
    }
}
