//! Execution domain types
//!
//! Records produced by running a pipeline or a single template. A record is
//! mutated only by the engine while the run is in flight and becomes immutable
//! once `completed_at` is set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::pipeline::{Pipeline, PipelineStep};

/// Execution status of a step or of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    /// `completed` and `failed` are final
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }

    /// Allowed moves: `pending -> running -> {completed | failed}`
    pub fn can_transition_to(self, next: ExecutionStatus) -> bool {
        matches!(
            (self, next),
            (ExecutionStatus::Pending, ExecutionStatus::Running)
                | (ExecutionStatus::Running, ExecutionStatus::Completed)
                | (ExecutionStatus::Running, ExecutionStatus::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExecutionStatus::Pending),
            "running" => Ok(ExecutionStatus::Running),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown execution status: {0}")]
pub struct UnknownStatus(pub String);

/// Rejected status change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid status transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ExecutionStatus,
    pub to: ExecutionStatus,
}

/// Per-step record of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecution {
    pub step_order: u32,
    pub template_id: Uuid,
    /// Fully rendered prompt; absent while the step has not been rendered
    pub input_prompt: Option<String>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub status: ExecutionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepExecution {
    /// Placeholder for a pipeline step that has not been attempted yet
    pub fn pending(step: &PipelineStep) -> Self {
        Self::new(step.order, step.template_id)
    }

    pub fn new(step_order: u32, template_id: Uuid) -> Self {
        Self {
            step_order,
            template_id,
            input_prompt: None,
            output: None,
            error: None,
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn start(&mut self) -> Result<(), InvalidTransition> {
        self.transition(ExecutionStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn complete(&mut self, output: String) -> Result<(), InvalidTransition> {
        self.transition(ExecutionStatus::Completed)?;
        self.output = Some(output);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<(), InvalidTransition> {
        self.transition(ExecutionStatus::Failed)?;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, next: ExecutionStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Record of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineExecution {
    pub id: Uuid,
    pub pipeline_id: Uuid,
    /// Snapshot of the caller-supplied input variables
    pub variables: HashMap<String, String>,
    pub step_executions: Vec<StepExecution>,
    /// Always derived from `step_executions`
    pub status: ExecutionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PipelineExecution {
    /// Fresh record with one pending placeholder per step
    pub fn new(pipeline: &Pipeline, variables: HashMap<String, String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pipeline_id: pipeline.id,
            variables,
            step_executions: pipeline.steps.iter().map(StepExecution::pending).collect(),
            status: ExecutionStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Overall status as a function of the step statuses
    ///
    /// Any failed step fails the run; the run is completed only when every
    /// step is. `pending`/`running` are only observable mid-run.
    pub fn derive_status(&self) -> ExecutionStatus {
        let steps = &self.step_executions;

        if steps.iter().any(|s| s.status == ExecutionStatus::Failed) {
            ExecutionStatus::Failed
        } else if steps.iter().all(|s| s.status == ExecutionStatus::Completed) {
            ExecutionStatus::Completed
        } else if steps.iter().all(|s| s.status == ExecutionStatus::Pending) {
            ExecutionStatus::Pending
        } else {
            ExecutionStatus::Running
        }
    }

    pub fn refresh_status(&mut self) {
        self.status = self.derive_status();
    }

    /// Stamp the termination time and settle the status
    pub fn finish(&mut self) {
        self.refresh_status();
        self.completed_at = Some(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        self.completed_at.is_some()
    }

    /// The step that ended the run, if any
    pub fn failed_step(&self) -> Option<&StepExecution> {
        self.step_executions
            .iter()
            .find(|s| s.status == ExecutionStatus::Failed)
    }
}

/// Record of one single-template run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateExecution {
    pub id: Uuid,
    pub template_id: Uuid,
    pub template_name: String,
    pub template_version: i32,
    pub provider: String,
    pub model: String,
    pub variables: HashMap<String, String>,
    pub input_prompt: Option<String>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub status: ExecutionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TemplateExecution {
    /// Apply the outcome of the single step and stamp the completion time
    pub fn settle(&mut self, step: StepExecution) {
        self.input_prompt = step.input_prompt;
        self.output = step.output;
        self.error = step.error;
        self.status = step.status;
        self.completed_at = Some(Utc::now());
    }
}
