//! Pipeline DTOs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::pipeline::PipelineStep;

/// Request to create a new pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePipeline {
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<CreatePipelineStep>,
}

/// A step as submitted by a caller; its order is its position in the list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePipelineStep {
    pub template_id: Uuid,
    pub provider: String,
    pub model: String,
    pub output_variable: String,
}

/// Partial update of a pipeline; `steps` replaces the whole step list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePipeline {
    pub name: Option<String>,
    pub description: Option<String>,
    pub steps: Option<Vec<CreatePipelineStep>>,
}

/// Request body of `POST /api/pipelines/{id}/execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutePipeline {
    pub variables: HashMap<String, String>,
}

/// Number submitted steps 1..N in submission order
pub fn number_steps(steps: &[CreatePipelineStep]) -> Vec<PipelineStep> {
    steps
        .iter()
        .enumerate()
        .map(|(idx, s)| PipelineStep {
            order: idx as u32 + 1,
            template_id: s.template_id,
            provider: s.provider.clone(),
            model: s.model.clone(),
            output_variable: s.output_variable.clone(),
        })
        .collect()
}
