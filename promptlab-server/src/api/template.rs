//! Template API Handlers
//!
//! HTTP endpoints for template management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use promptlab_core::domain::template::{Template, TemplateVersion};
use promptlab_core::dto::Pagination;
use promptlab_core::dto::template::{CreateTemplate, TemplateVariables, UpdateTemplate};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::service::template_service::{self, TemplateError};
use crate::state::AppState;

fn into_api_error(err: TemplateError) -> ApiError {
    match err {
        TemplateError::NotFound(id) => ApiError::NotFound(format!("Template {} not found", id)),
        TemplateError::ValidationError(msg) => ApiError::BadRequest(msg),
        TemplateError::DatabaseError(err) => ApiError::DatabaseError(err),
    }
}

/// POST /api/templates
/// Create a new template
pub async fn create_template(
    State(state): State<AppState>,
    Json(req): Json<CreateTemplate>,
) -> ApiResult<(StatusCode, Json<Template>)> {
    tracing::info!("Creating template: {}", req.name);

    let template = template_service::create_template(&state.pool, req)
        .await
        .map_err(into_api_error)?;

    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /api/templates
/// List templates
pub async fn list_templates(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Template>>> {
    tracing::debug!("Listing templates (skip={}, limit={})", page.skip, page.limit);

    let templates = template_service::list_templates(&state.pool, page)
        .await
        .map_err(into_api_error)?;

    Ok(Json(templates))
}

/// GET /api/templates/{id}
/// Get template by ID with its latest version
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Template>> {
    tracing::debug!("Getting template: {}", id);

    let template = template_service::get_template(&state.pool, id)
        .await
        .map_err(into_api_error)?;

    Ok(Json(template))
}

/// PUT /api/templates/{id}
/// Update a template; new content creates a new version
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTemplate>,
) -> ApiResult<Json<Template>> {
    tracing::info!("Updating template: {}", id);

    let template = template_service::update_template(&state.pool, id, req)
        .await
        .map_err(into_api_error)?;

    Ok(Json(template))
}

/// DELETE /api/templates/{id}
/// Delete a template
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting template: {}", id);

    template_service::delete_template(&state.pool, id)
        .await
        .map_err(into_api_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/templates/{id}/versions
/// List all versions of a template, newest first
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<TemplateVersion>>> {
    tracing::debug!("Listing versions of template: {}", id);

    let versions = template_service::list_versions(&state.pool, id)
        .await
        .map_err(into_api_error)?;

    Ok(Json(versions))
}

/// GET /api/templates/{id}/variables
/// Placeholder names of the latest version
pub async fn get_variables(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TemplateVariables>> {
    tracing::debug!("Extracting variables of template: {}", id);

    let variables = template_service::get_variables(&state.pool, id)
        .await
        .map_err(into_api_error)?;

    Ok(Json(variables))
}
