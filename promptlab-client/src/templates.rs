//! Template-related API endpoints

use crate::PromptLabClient;
use crate::error::Result;
use promptlab_core::domain::template::{Template, TemplateVersion};
use promptlab_core::dto::Pagination;
use promptlab_core::dto::template::{CreateTemplate, TemplateVariables, UpdateTemplate};
use uuid::Uuid;

impl PromptLabClient {
    // =============================================================================
    // Template Management
    // =============================================================================

    /// Create a new template; its content becomes version 1
    pub async fn create_template(&self, req: CreateTemplate) -> Result<Template> {
        let response = self
            .client
            .post(self.url("/api/templates"))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List templates, newest first
    pub async fn list_templates(&self, page: Pagination) -> Result<Vec<Template>> {
        let response = self
            .client
            .get(self.url("/api/templates"))
            .query(&page)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a template with its latest version
    pub async fn get_template(&self, template_id: Uuid) -> Result<Template> {
        let url = self.url(&format!("/api/templates/{}", template_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Update a template
    ///
    /// Setting `content` creates a new version; name and description are
    /// edited in place.
    pub async fn update_template(&self, template_id: Uuid, req: UpdateTemplate) -> Result<Template> {
        let url = self.url(&format!("/api/templates/{}", template_id));
        let response = self.client.put(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Delete a template and all of its versions
    pub async fn delete_template(&self, template_id: Uuid) -> Result<()> {
        let url = self.url(&format!("/api/templates/{}", template_id));
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }

    /// All versions of a template, highest version first
    pub async fn list_template_versions(&self, template_id: Uuid) -> Result<Vec<TemplateVersion>> {
        let url = self.url(&format!("/api/templates/{}/versions", template_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Placeholder names referenced by a template's latest version
    pub async fn get_template_variables(&self, template_id: Uuid) -> Result<TemplateVariables> {
        let url = self.url(&format!("/api/templates/{}/variables", template_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
