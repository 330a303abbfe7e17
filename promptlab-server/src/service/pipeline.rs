//! Pipeline Service
//!
//! Business logic for pipeline management.

use promptlab_core::domain::pipeline::{
    Pipeline, PipelineStep, check_provider_model, validate_steps,
};
use promptlab_core::dto::Pagination;
use promptlab_core::dto::pipeline::{CreatePipeline, UpdatePipeline, number_steps};
use promptlab_engine::ProviderGateway;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{pipeline_repository, template_repository};

/// Longest accepted pipeline name
const MAX_NAME_LEN: usize = 255;

/// Service error type
#[derive(Debug)]
pub enum PipelineError {
    NotFound(Uuid),
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        PipelineError::DatabaseError(err)
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Create a new pipeline
pub async fn create_pipeline(
    pool: &PgPool,
    gateway: &dyn ProviderGateway,
    req: CreatePipeline,
) -> Result<Pipeline> {
    validate_name(&req.name)?;
    let steps = number_steps(&req.steps);
    validate_pipeline_steps(&steps, gateway)?;
    ensure_templates_exist(pool, &steps).await?;

    let pipeline =
        pipeline_repository::create(pool, &req.name, req.description.as_deref(), steps).await?;

    tracing::info!(
        "Pipeline created: {} ({}) with {} steps",
        pipeline.name,
        pipeline.id,
        pipeline.steps.len()
    );

    Ok(pipeline)
}

/// Get a pipeline by ID
pub async fn get_pipeline(pool: &PgPool, id: Uuid) -> Result<Pipeline> {
    let pipeline = pipeline_repository::find_by_id(pool, id)
        .await?
        .ok_or(PipelineError::NotFound(id))?;

    Ok(pipeline)
}

/// List pipelines
pub async fn list_pipelines(pool: &PgPool, page: Pagination) -> Result<Vec<Pipeline>> {
    page.validate().map_err(PipelineError::ValidationError)?;
    let pipelines = pipeline_repository::list(pool, page).await?;
    Ok(pipelines)
}

/// Update a pipeline; submitted steps replace the current ones
pub async fn update_pipeline(
    pool: &PgPool,
    gateway: &dyn ProviderGateway,
    id: Uuid,
    req: UpdatePipeline,
) -> Result<Pipeline> {
    if let Some(name) = &req.name {
        validate_name(name)?;
    }

    let steps = req.steps.as_deref().map(number_steps);
    if let Some(steps) = &steps {
        validate_pipeline_steps(steps, gateway)?;
        ensure_templates_exist(pool, steps).await?;
    }

    let updated = pipeline_repository::update(
        pool,
        id,
        req.name.as_deref(),
        req.description.as_deref(),
        steps.as_deref(),
    )
    .await?;

    if !updated {
        return Err(PipelineError::NotFound(id));
    }

    tracing::info!("Pipeline updated: {}", id);

    get_pipeline(pool, id).await
}

/// Delete a pipeline
///
/// Its execution history is kept.
pub async fn delete_pipeline(pool: &PgPool, id: Uuid) -> Result<()> {
    let deleted = pipeline_repository::delete(pool, id).await?;

    if !deleted {
        return Err(PipelineError::NotFound(id));
    }

    tracing::info!("Pipeline deleted: {}", id);

    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PipelineError::ValidationError(
            "Pipeline name cannot be empty".to_string(),
        ));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(PipelineError::ValidationError(format!(
            "Pipeline name is too long (max {} characters)",
            MAX_NAME_LEN
        )));
    }

    Ok(())
}

fn validate_pipeline_steps(steps: &[PipelineStep], gateway: &dyn ProviderGateway) -> Result<()> {
    validate_steps(steps).map_err(|e| PipelineError::ValidationError(e.to_string()))?;

    for step in steps {
        check_provider_model(&step.provider, &step.model)
            .map_err(|msg| PipelineError::ValidationError(format!("Step {}: {}", step.order, msg)))?;

        if !gateway.knows(&step.provider) {
            return Err(PipelineError::ValidationError(format!(
                "Step {}: unknown provider '{}'",
                step.order, step.provider
            )));
        }
    }

    Ok(())
}

async fn ensure_templates_exist(pool: &PgPool, steps: &[PipelineStep]) -> Result<()> {
    for step in steps {
        if !template_repository::exists(pool, step.template_id).await? {
            return Err(PipelineError::ValidationError(format!(
                "Step {}: template {} not found",
                step.order, step.template_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlab_core::dto::pipeline::CreatePipelineStep;
    use promptlab_engine::ProviderRegistry;
    use promptlab_engine::provider::MockProvider;

    fn gateway() -> ProviderRegistry {
        ProviderRegistry::default().register(MockProvider::new())
    }

    fn step(provider: &str, output_variable: &str) -> CreatePipelineStep {
        CreatePipelineStep {
            template_id: Uuid::new_v4(),
            provider: provider.to_string(),
            model: "mock-model".to_string(),
            output_variable: output_variable.to_string(),
        }
    }

    #[test]
    fn test_validate_empty_name() {
        let result = validate_name("");
        assert!(matches!(result, Err(PipelineError::ValidationError(_))));
    }

    #[test]
    fn test_validate_requires_steps() {
        let result = validate_pipeline_steps(&[], &gateway());
        assert!(matches!(result, Err(PipelineError::ValidationError(_))));
    }

    #[test]
    fn test_validate_duplicate_output_variable() {
        let steps = number_steps(&[step("mock", "out"), step("mock", "out")]);
        let result = validate_pipeline_steps(&steps, &gateway());
        assert!(matches!(result, Err(PipelineError::ValidationError(msg)) if msg.contains("out")));
    }

    #[test]
    fn test_validate_output_variable_format() {
        let steps = number_steps(&[step("mock", "not valid")]);
        assert!(validate_pipeline_steps(&steps, &gateway()).is_err());

        let steps = number_steps(&[step("mock", &"x".repeat(101))]);
        assert!(validate_pipeline_steps(&steps, &gateway()).is_err());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let steps = number_steps(&[step("mock", "a"), step("cohere", "b")]);
        let result = validate_pipeline_steps(&steps, &gateway());
        assert!(matches!(result, Err(PipelineError::ValidationError(msg)) if msg.contains("cohere")));
    }

    #[test]
    fn test_validate_valid_steps() {
        let steps = number_steps(&[step("mock", "english_text"), step("mock", "summary")]);
        assert!(validate_pipeline_steps(&steps, &gateway()).is_ok());
    }

    #[test]
    fn test_validate_provider_and_model_lengths() {
        let mut long_model = step("mock", "a");
        long_model.model = "m".repeat(300);
        let result = validate_pipeline_steps(&number_steps(&[long_model]), &gateway());
        assert!(
            matches!(result, Err(PipelineError::ValidationError(msg)) if msg == "Step 1: model name is too long (max 255 characters)")
        );

        // A fallback gateway knows every name, so length must still be checked
        let fallback = ProviderRegistry::default().with_fallback(MockProvider::new());
        let steps = number_steps(&[step("mock", "a"), step(&"p".repeat(101), "b")]);
        let result = validate_pipeline_steps(&steps, &fallback);
        assert!(
            matches!(result, Err(PipelineError::ValidationError(msg)) if msg.starts_with("Step 2: provider name is too long"))
        );
    }
}
