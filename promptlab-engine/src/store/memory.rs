//! In-memory store implementations
//!
//! Used by tests and by embedders that have no database. Every record is held
//! behind a `RwLock`; a poisoned lock surfaces as a backend error.

use async_trait::async_trait;
use promptlab_core::domain::execution::{PipelineExecution, TemplateExecution};
use promptlab_core::dto::Pagination;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::{ExecutionStore, StoreError, TemplateSnapshot, TemplateStore};

#[derive(Debug, thiserror::Error)]
#[error("store lock poisoned")]
struct Poisoned;

/// Template contents keyed by template id
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<Uuid, TemplateSnapshot>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template at version 1 and return its id
    pub fn insert(&self, name: &str, content: &str) -> Result<Uuid, StoreError> {
        let template_id = Uuid::new_v4();
        let snapshot = TemplateSnapshot {
            template_id,
            name: name.to_string(),
            version_number: 1,
            content: content.to_string(),
        };
        self.templates
            .write()
            .map_err(|_| StoreError::backend(Poisoned))?
            .insert(template_id, snapshot);
        Ok(template_id)
    }

    /// Replace the content of an existing template, bumping its version
    pub fn update(&self, template_id: Uuid, content: &str) -> Result<i32, StoreError> {
        let mut templates = self
            .templates
            .write()
            .map_err(|_| StoreError::backend(Poisoned))?;
        let snapshot = templates
            .get_mut(&template_id)
            .ok_or_else(|| StoreError::template_not_found(template_id))?;
        snapshot.version_number += 1;
        snapshot.content = content.to_string();
        Ok(snapshot.version_number)
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn latest_content(&self, template_id: Uuid) -> Result<TemplateSnapshot, StoreError> {
        self.templates
            .read()
            .map_err(|_| StoreError::backend(Poisoned))?
            .get(&template_id)
            .cloned()
            .ok_or_else(|| StoreError::template_not_found(template_id))
    }
}

/// Execution records in insertion order
#[derive(Debug, Default)]
pub struct InMemoryExecutionStore {
    pipeline_executions: RwLock<Vec<PipelineExecution>>,
    template_executions: RwLock<Vec<TemplateExecution>>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pipeline executions saved so far
    pub fn len(&self) -> usize {
        self.pipeline_executions
            .read()
            .map(|executions| executions.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn page<T: Clone>(items: impl DoubleEndedIterator<Item = T>, page: Pagination) -> Vec<T> {
    items
        .rev()
        .skip(page.skip.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn save(&self, execution: &PipelineExecution) -> Result<Uuid, StoreError> {
        let mut executions = self
            .pipeline_executions
            .write()
            .map_err(|_| StoreError::backend(Poisoned))?;
        executions.retain(|e| e.id != execution.id);
        executions.push(execution.clone());
        Ok(execution.id)
    }

    async fn get(&self, id: Uuid) -> Result<PipelineExecution, StoreError> {
        self.pipeline_executions
            .read()
            .map_err(|_| StoreError::backend(Poisoned))?
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| StoreError::execution_not_found(id))
    }

    async fn list(
        &self,
        pipeline_id: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<Vec<PipelineExecution>, StoreError> {
        let executions = self
            .pipeline_executions
            .read()
            .map_err(|_| StoreError::backend(Poisoned))?;
        let matching: Vec<_> = executions
            .iter()
            .filter(|e| pipeline_id.is_none_or(|id| e.pipeline_id == id))
            .cloned()
            .collect();
        Ok(page(matching.into_iter(), pagination))
    }

    async fn save_template_execution(
        &self,
        execution: &TemplateExecution,
    ) -> Result<Uuid, StoreError> {
        let mut executions = self
            .template_executions
            .write()
            .map_err(|_| StoreError::backend(Poisoned))?;
        executions.retain(|e| e.id != execution.id);
        executions.push(execution.clone());
        Ok(execution.id)
    }

    async fn get_template_execution(&self, id: Uuid) -> Result<TemplateExecution, StoreError> {
        self.template_executions
            .read()
            .map_err(|_| StoreError::backend(Poisoned))?
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| StoreError::execution_not_found(id))
    }

    async fn list_template_executions(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<TemplateExecution>, StoreError> {
        let executions = self
            .template_executions
            .read()
            .map_err(|_| StoreError::backend(Poisoned))?;
        Ok(page(executions.iter().cloned(), pagination))
    }
}
