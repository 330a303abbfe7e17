//! Pipeline-related API endpoints

use crate::PromptLabClient;
use crate::error::Result;
use promptlab_core::domain::execution::PipelineExecution;
use promptlab_core::domain::pipeline::Pipeline;
use promptlab_core::dto::Pagination;
use promptlab_core::dto::pipeline::{CreatePipeline, ExecutePipeline, UpdatePipeline};
use std::collections::HashMap;
use uuid::Uuid;

impl PromptLabClient {
    // =============================================================================
    // Pipeline Management
    // =============================================================================

    /// Create a new pipeline
    ///
    /// Steps are numbered in the order they are submitted.
    pub async fn create_pipeline(&self, req: CreatePipeline) -> Result<Pipeline> {
        let response = self
            .client
            .post(self.url("/api/pipelines"))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List pipelines, newest first
    pub async fn list_pipelines(&self, page: Pagination) -> Result<Vec<Pipeline>> {
        let response = self
            .client
            .get(self.url("/api/pipelines"))
            .query(&page)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a pipeline by ID
    pub async fn get_pipeline(&self, pipeline_id: Uuid) -> Result<Pipeline> {
        let url = self.url(&format!("/api/pipelines/{}", pipeline_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Update a pipeline; submitted steps replace the current ones
    pub async fn update_pipeline(&self, pipeline_id: Uuid, req: UpdatePipeline) -> Result<Pipeline> {
        let url = self.url(&format!("/api/pipelines/{}", pipeline_id));
        let response = self.client.put(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Delete a pipeline
    pub async fn delete_pipeline(&self, pipeline_id: Uuid) -> Result<()> {
        let url = self.url(&format!("/api/pipelines/{}", pipeline_id));
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Pipeline Execution
    // =============================================================================

    /// Run a pipeline with the given input variables
    ///
    /// Returns the execution record whether the run completed or failed;
    /// check its `status`.
    pub async fn execute_pipeline(
        &self,
        pipeline_id: Uuid,
        variables: HashMap<String, String>,
    ) -> Result<PipelineExecution> {
        let url = self.url(&format!("/api/pipelines/{}/execute", pipeline_id));
        let response = self
            .client
            .post(&url)
            .json(&ExecutePipeline { variables })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Execution history of one pipeline, newest first
    pub async fn list_pipeline_executions(
        &self,
        pipeline_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<PipelineExecution>> {
        let url = self.url(&format!("/api/pipelines/{}/executions", pipeline_id));
        let response = self.client.get(&url).query(&page).send().await?;

        self.handle_response(response).await
    }

    /// Execution history of all pipelines, newest first
    pub async fn list_all_pipeline_executions(
        &self,
        page: Pagination,
    ) -> Result<Vec<PipelineExecution>> {
        let response = self
            .client
            .get(self.url("/api/pipeline-executions"))
            .query(&page)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a pipeline execution by ID
    pub async fn get_pipeline_execution(&self, execution_id: Uuid) -> Result<PipelineExecution> {
        let url = self.url(&format!("/api/pipeline-executions/{}", execution_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
