//! Template Service
//!
//! Business logic for template management.

use promptlab_core::domain::template::{Template, TemplateVersion};
use promptlab_core::dto::Pagination;
use promptlab_core::dto::template::{CreateTemplate, TemplateVariables, UpdateTemplate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::template_repository;

/// Longest accepted template name
const MAX_NAME_LEN: usize = 255;

/// Service error type
#[derive(Debug)]
pub enum TemplateError {
    NotFound(Uuid),
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for TemplateError {
    fn from(err: sqlx::Error) -> Self {
        TemplateError::DatabaseError(err)
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;

/// Create a new template at version 1
pub async fn create_template(pool: &PgPool, req: CreateTemplate) -> Result<Template> {
    validate_name(&req.name)?;
    validate_content(&req.content)?;

    let template = template_repository::create(pool, &req).await?;

    tracing::info!("Template created: {} ({})", template.name, template.id);

    Ok(template)
}

/// Get a template by ID
pub async fn get_template(pool: &PgPool, id: Uuid) -> Result<Template> {
    template_repository::find_by_id(pool, id)
        .await?
        .ok_or(TemplateError::NotFound(id))
}

/// List templates
pub async fn list_templates(pool: &PgPool, page: Pagination) -> Result<Vec<Template>> {
    page.validate().map_err(TemplateError::ValidationError)?;
    let templates = template_repository::list(pool, page).await?;
    Ok(templates)
}

/// Update a template; new content becomes the next version
pub async fn update_template(pool: &PgPool, id: Uuid, req: UpdateTemplate) -> Result<Template> {
    if let Some(name) = &req.name {
        validate_name(name)?;
    }
    if let Some(content) = &req.content {
        validate_content(content)?;
    }

    let updated = template_repository::update(pool, id, &req).await?;

    if !updated {
        return Err(TemplateError::NotFound(id));
    }

    let template = get_template(pool, id).await?;

    tracing::info!(
        "Template updated: {} now at version {}",
        id,
        template.latest_version.version_number
    );

    Ok(template)
}

/// Delete a template
pub async fn delete_template(pool: &PgPool, id: Uuid) -> Result<()> {
    let deleted = template_repository::delete(pool, id).await?;

    if !deleted {
        return Err(TemplateError::NotFound(id));
    }

    tracing::info!("Template deleted: {}", id);

    Ok(())
}

/// All versions of a template, newest first
pub async fn list_versions(pool: &PgPool, id: Uuid) -> Result<Vec<TemplateVersion>> {
    if !template_repository::exists(pool, id).await? {
        return Err(TemplateError::NotFound(id));
    }

    let versions = template_repository::list_versions(pool, id).await?;
    Ok(versions)
}

/// Placeholder names referenced by the latest version
pub async fn get_variables(pool: &PgPool, id: Uuid) -> Result<TemplateVariables> {
    let template = get_template(pool, id).await?;

    Ok(TemplateVariables {
        template_id: template.id,
        version_number: template.latest_version.version_number,
        variables: template.variables(),
    })
}

// =============================================================================
// Validation
// =============================================================================

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TemplateError::ValidationError(
            "Template name cannot be empty".to_string(),
        ));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(TemplateError::ValidationError(format!(
            "Template name is too long (max {} characters)",
            MAX_NAME_LEN
        )));
    }

    Ok(())
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(TemplateError::ValidationError(
            "Template content cannot be empty".to_string(),
        ));
    }

    Ok(())
}
