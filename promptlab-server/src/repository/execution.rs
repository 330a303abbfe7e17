//! Execution Repository
//!
//! Handles all database operations related to pipeline and template
//! execution records.

use promptlab_core::domain::execution::{
    ExecutionStatus, PipelineExecution, StepExecution, TemplateExecution,
};
use promptlab_core::dto::Pagination;
use sqlx::PgPool;
use sqlx::types::Json;
use std::collections::HashMap;
use uuid::Uuid;

// =============================================================================
// Pipeline Executions
// =============================================================================

/// Insert a pipeline execution and its step records
pub async fn save_pipeline_execution(
    pool: &PgPool,
    execution: &PipelineExecution,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO pipeline_executions (id, pipeline_id, variables, status, created_at, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(execution.id)
    .bind(execution.pipeline_id)
    .bind(Json(&execution.variables))
    .bind(execution.status.as_str())
    .bind(execution.created_at)
    .bind(execution.completed_at)
    .execute(&mut *tx)
    .await?;

    for step in &execution.step_executions {
        sqlx::query(
            r#"
            INSERT INTO pipeline_step_executions (
                execution_id, step_order, template_id, input_prompt, output, error,
                status, started_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(execution.id)
        .bind(step.step_order as i32)
        .bind(step.template_id)
        .bind(&step.input_prompt)
        .bind(&step.output)
        .bind(&step.error)
        .bind(step.status.as_str())
        .bind(step.started_at)
        .bind(step.completed_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Find a pipeline execution by ID
pub async fn find_pipeline_execution(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<PipelineExecution>, sqlx::Error> {
    let row = sqlx::query_as::<_, PipelineExecutionRow>(
        r#"
        SELECT id, pipeline_id, variables, status, created_at, completed_at
        FROM pipeline_executions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut steps = find_step_executions(pool, &[id]).await?;
    let execution = row.into_execution(steps.remove(&id).unwrap_or_default())?;
    Ok(Some(execution))
}

/// List pipeline executions, newest first, optionally for one pipeline
pub async fn list_pipeline_executions(
    pool: &PgPool,
    pipeline_id: Option<Uuid>,
    page: Pagination,
) -> Result<Vec<PipelineExecution>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PipelineExecutionRow>(
        r#"
        SELECT id, pipeline_id, variables, status, created_at, completed_at
        FROM pipeline_executions
        WHERE ($1::uuid IS NULL OR pipeline_id = $1)
        ORDER BY created_at DESC
        OFFSET $2 LIMIT $3
        "#,
    )
    .bind(pipeline_id)
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut steps = find_step_executions(pool, &ids).await?;

    rows.into_iter()
        .map(|row| {
            let own = steps.remove(&row.id).unwrap_or_default();
            row.into_execution(own)
        })
        .collect()
}

async fn find_step_executions(
    pool: &PgPool,
    execution_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<StepExecution>>, sqlx::Error> {
    if execution_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, StepExecutionRow>(
        r#"
        SELECT execution_id, step_order, template_id, input_prompt, output, error,
               status, started_at, completed_at
        FROM pipeline_step_executions
        WHERE execution_id = ANY($1)
        ORDER BY execution_id, step_order ASC
        "#,
    )
    .bind(execution_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<StepExecution>> = HashMap::new();
    for row in rows {
        let execution_id = row.execution_id;
        grouped
            .entry(execution_id)
            .or_default()
            .push(StepExecution::try_from(row)?);
    }

    Ok(grouped)
}

// =============================================================================
// Template Executions
// =============================================================================

/// Insert a single-template execution
pub async fn save_template_execution(
    pool: &PgPool,
    execution: &TemplateExecution,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO template_executions (
            id, template_id, template_name, template_version, provider, model,
            variables, input_prompt, output, error, status, created_at, completed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(execution.id)
    .bind(execution.template_id)
    .bind(&execution.template_name)
    .bind(execution.template_version)
    .bind(&execution.provider)
    .bind(&execution.model)
    .bind(Json(&execution.variables))
    .bind(&execution.input_prompt)
    .bind(&execution.output)
    .bind(&execution.error)
    .bind(execution.status.as_str())
    .bind(execution.created_at)
    .bind(execution.completed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Find a single-template execution by ID
pub async fn find_template_execution(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<TemplateExecution>, sqlx::Error> {
    let row = sqlx::query_as::<_, TemplateExecutionRow>(
        r#"
        SELECT id, template_id, template_name, template_version, provider, model,
               variables, input_prompt, output, error, status, created_at, completed_at
        FROM template_executions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(TemplateExecution::try_from).transpose()
}

/// List single-template executions, newest first
pub async fn list_template_executions(
    pool: &PgPool,
    page: Pagination,
) -> Result<Vec<TemplateExecution>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TemplateExecutionRow>(
        r#"
        SELECT id, template_id, template_name, template_version, provider, model,
               variables, input_prompt, output, error, status, created_at, completed_at
        FROM template_executions
        ORDER BY created_at DESC
        OFFSET $1 LIMIT $2
        "#,
    )
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(TemplateExecution::try_from).collect()
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_status(status: &str) -> Result<ExecutionStatus, sqlx::Error> {
    status
        .parse::<ExecutionStatus>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct PipelineExecutionRow {
    id: Uuid,
    pipeline_id: Uuid,
    variables: Json<HashMap<String, String>>,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl PipelineExecutionRow {
    fn into_execution(self, steps: Vec<StepExecution>) -> Result<PipelineExecution, sqlx::Error> {
        Ok(PipelineExecution {
            id: self.id,
            pipeline_id: self.pipeline_id,
            variables: self.variables.0,
            step_executions: steps,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StepExecutionRow {
    execution_id: Uuid,
    step_order: i32,
    template_id: Uuid,
    input_prompt: Option<String>,
    output: Option<String>,
    error: Option<String>,
    status: String,
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TryFrom<StepExecutionRow> for StepExecution {
    type Error = sqlx::Error;

    fn try_from(row: StepExecutionRow) -> Result<Self, Self::Error> {
        Ok(StepExecution {
            step_order: row.step_order as u32,
            template_id: row.template_id,
            input_prompt: row.input_prompt,
            output: row.output,
            error: row.error,
            status: parse_status(&row.status)?,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TemplateExecutionRow {
    id: Uuid,
    template_id: Uuid,
    template_name: String,
    template_version: i32,
    provider: String,
    model: String,
    variables: Json<HashMap<String, String>>,
    input_prompt: Option<String>,
    output: Option<String>,
    error: Option<String>,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TryFrom<TemplateExecutionRow> for TemplateExecution {
    type Error = sqlx::Error;

    fn try_from(row: TemplateExecutionRow) -> Result<Self, Self::Error> {
        Ok(TemplateExecution {
            id: row.id,
            template_id: row.template_id,
            template_name: row.template_name,
            template_version: row.template_version,
            provider: row.provider,
            model: row.model,
            variables: row.variables.0,
            input_prompt: row.input_prompt,
            output: row.output,
            error: row.error,
            status: parse_status(&row.status)?,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}
