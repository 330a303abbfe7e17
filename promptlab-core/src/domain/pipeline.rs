//! Pipeline domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

use crate::placeholder::is_identifier;

/// Longest accepted output variable name
pub const MAX_OUTPUT_VARIABLE_LEN: usize = 100;

/// Longest accepted provider name
pub const MAX_PROVIDER_LEN: usize = 100;

/// Longest accepted model name
pub const MAX_MODEL_LEN: usize = 255;

/// Pipeline definition
///
/// Steps run strictly in `order`; each step's output is bound under its
/// `output_variable` for the steps after it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<PipelineStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Pipeline {
    /// Check the structural invariants of the step list
    pub fn validate(&self) -> Result<(), DefinitionError> {
        validate_steps(&self.steps)
    }

    /// Check the steps against the caller-supplied input variables
    ///
    /// On top of [`Pipeline::validate`], an output variable may not rebind a
    /// name that the inputs already provide.
    pub fn validate_for_inputs(
        &self,
        inputs: &HashMap<String, String>,
    ) -> Result<(), DefinitionError> {
        self.validate()?;

        if let Some(step) = self
            .steps
            .iter()
            .find(|s| inputs.contains_key(&s.output_variable))
        {
            return Err(DefinitionError::ShadowedVariable(
                step.output_variable.clone(),
            ));
        }

        Ok(())
    }

    /// Distinct template ids referenced by the steps, in step order
    pub fn template_ids(&self) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        self.steps
            .iter()
            .map(|s| s.template_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// A single step of a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStep {
    /// 1-based position in the pipeline
    pub order: u32,
    pub template_id: Uuid,
    pub provider: String,
    pub model: String,
    pub output_variable: String,
}

/// A pipeline definition that cannot be executed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("Pipeline has no steps")]
    EmptyPipeline,

    #[error("Step order must be sequential: expected {expected}, found {found}")]
    StepOrderGap { expected: u32, found: u32 },

    #[error("Step {order}: '{name}' is not a valid output variable name")]
    InvalidOutputVariable { order: u32, name: String },

    #[error("Output variable '{0}' is defined by more than one step")]
    DuplicateOutputVariable(String),

    #[error("Output variable '{0}' would overwrite an input variable")]
    ShadowedVariable(String),

    #[error("Template {0} not found")]
    TemplateNotFound(Uuid),
}

/// Validate an ordered step list
///
/// Steps must be numbered 1..N without gaps, and every output variable must be
/// a valid identifier that no other step defines.
pub fn validate_steps(steps: &[PipelineStep]) -> Result<(), DefinitionError> {
    if steps.is_empty() {
        return Err(DefinitionError::EmptyPipeline);
    }

    let mut outputs = HashSet::new();

    for (idx, step) in steps.iter().enumerate() {
        let expected = idx as u32 + 1;
        if step.order != expected {
            return Err(DefinitionError::StepOrderGap {
                expected,
                found: step.order,
            });
        }

        if !is_identifier(&step.output_variable)
            || step.output_variable.len() > MAX_OUTPUT_VARIABLE_LEN
        {
            return Err(DefinitionError::InvalidOutputVariable {
                order: step.order,
                name: step.output_variable.clone(),
            });
        }

        if !outputs.insert(step.output_variable.as_str()) {
            return Err(DefinitionError::DuplicateOutputVariable(
                step.output_variable.clone(),
            ));
        }
    }

    Ok(())
}

/// Check that a provider/model pair is present and within the stored lengths
///
/// Lengths are counted in characters. Returns a message naming the offending
/// field.
pub fn check_provider_model(provider: &str, model: &str) -> Result<(), String> {
    for (field, value, max) in [
        ("provider", provider, MAX_PROVIDER_LEN),
        ("model", model, MAX_MODEL_LEN),
    ] {
        if value.trim().is_empty() {
            return Err(format!("{} cannot be empty", field));
        }
        if value.chars().count() > max {
            return Err(format!("{} name is too long (max {} characters)", field, max));
        }
    }
    Ok(())
}
