//! Engine error types

use promptlab_core::domain::execution::InvalidTransition;
use promptlab_core::domain::pipeline::DefinitionError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that abort a run without producing a persisted record
///
/// A run whose steps fail is *not* an error: it yields a record with status
/// `failed`. These variants cover requests that never reach execution and
/// infrastructure that breaks around it.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The pipeline cannot be executed as defined; no provider was called
    #[error("Invalid pipeline definition: {0}")]
    Definition(#[from] DefinitionError),

    /// Template content could not be loaded for a reason other than absence
    #[error("Failed to load template: {0}")]
    TemplateStore(#[source] StoreError),

    /// The run finished but its record could not be saved
    #[error("Failed to persist execution: {0}")]
    Persistence(#[source] StoreError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl EngineError {
    /// Whether the caller's request was at fault rather than infrastructure
    pub fn is_definition_error(&self) -> bool {
        matches!(self, EngineError::Definition(_))
    }
}
