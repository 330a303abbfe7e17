//! Execution progress hook
//!
//! The engine reports every step state change to an observer so that callers
//! can stream progress while a run is in flight. Observers must not block.

use promptlab_core::domain::execution::StepExecution;
use uuid::Uuid;

/// Receives step state changes while a run is in flight
pub trait ExecutionObserver: Send + Sync {
    /// Called after a step moved to `running`, `completed` or `failed`
    fn on_step(&self, execution_id: Uuid, step: &StepExecution);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {
    fn on_step(&self, _execution_id: Uuid, _step: &StepExecution) {}
}
