//! Store interfaces
//!
//! The engine reads template content and writes execution records through
//! these traits. Implementations are plain persistence with no business logic:
//! the server backs them with Postgres, tests use [`memory`].
//!
//! All stores are trait-based to enable testing and dependency injection.

pub mod memory;

use async_trait::async_trait;
use promptlab_core::domain::execution::{PipelineExecution, TemplateExecution};
use promptlab_core::dto::Pagination;
use thiserror::Error;
use uuid::Uuid;

pub use memory::{InMemoryExecutionStore, InMemoryTemplateStore};

/// Errors raised by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this id (or, for templates, no version yet)
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    /// The backing storage failed or is unreachable
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn template_not_found(id: Uuid) -> Self {
        StoreError::NotFound {
            kind: "Template",
            id,
        }
    }

    pub fn execution_not_found(id: Uuid) -> Self {
        StoreError::NotFound {
            kind: "Execution",
            id,
        }
    }

    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Latest content of a template as seen at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSnapshot {
    pub template_id: Uuid,
    pub name: String,
    pub version_number: i32,
    pub content: String,
}

/// Read access to template content
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Content of the highest version of a template
    ///
    /// Fails with [`StoreError::NotFound`] if the id is unknown or the
    /// template has no version.
    async fn latest_content(&self, template_id: Uuid) -> Result<TemplateSnapshot, StoreError>;
}

/// Persistence of finished execution records
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Persist a pipeline execution together with its step records
    async fn save(&self, execution: &PipelineExecution) -> Result<Uuid, StoreError>;

    /// Get a pipeline execution by id
    async fn get(&self, id: Uuid) -> Result<PipelineExecution, StoreError>;

    /// List pipeline executions, newest first, optionally for one pipeline
    async fn list(
        &self,
        pipeline_id: Option<Uuid>,
        page: Pagination,
    ) -> Result<Vec<PipelineExecution>, StoreError>;

    /// Persist a single-template execution
    async fn save_template_execution(
        &self,
        execution: &TemplateExecution,
    ) -> Result<Uuid, StoreError>;

    /// Get a single-template execution by id
    async fn get_template_execution(&self, id: Uuid) -> Result<TemplateExecution, StoreError>;

    /// List single-template executions, newest first
    async fn list_template_executions(
        &self,
        page: Pagination,
    ) -> Result<Vec<TemplateExecution>, StoreError>;
}
