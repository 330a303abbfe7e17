//! Single-template execution endpoints

use crate::PromptLabClient;
use crate::error::Result;
use promptlab_core::domain::execution::TemplateExecution;
use promptlab_core::dto::Pagination;
use promptlab_core::dto::execution::ExecuteTemplate;
use uuid::Uuid;

impl PromptLabClient {
    /// Run one template against a provider
    ///
    /// Render and provider failures come back as a record with status
    /// `failed`, not as an error.
    pub async fn execute_template(&self, req: ExecuteTemplate) -> Result<TemplateExecution> {
        let response = self
            .client
            .post(self.url("/api/executions"))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn list_template_executions(&self, page: Pagination) -> Result<Vec<TemplateExecution>> {
        let response = self
            .client
            .get(self.url("/api/executions"))
            .query(&page)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn get_template_execution(&self, execution_id: Uuid) -> Result<TemplateExecution> {
        let url = self.url(&format!("/api/executions/{}", execution_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
