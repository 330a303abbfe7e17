//! Pipeline Repository
//!
//! Handles all database operations related to pipelines and their steps.

use promptlab_core::domain::pipeline::{Pipeline, PipelineStep};
use promptlab_core::dto::Pagination;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

/// Create a new pipeline with its (already numbered) steps
pub async fn create(
    pool: &PgPool,
    name: &str,
    description: Option<&str>,
    steps: Vec<PipelineStep>,
) -> Result<Pipeline, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = chrono::Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO pipelines (id, name, description, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    insert_steps(&mut tx, id, &steps).await?;
    tx.commit().await?;

    Ok(Pipeline {
        id,
        name: name.to_string(),
        description: description.map(str::to_string),
        steps,
        created_at: now,
        updated_at: None,
    })
}

/// Find a pipeline by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Pipeline>, sqlx::Error> {
    let row = sqlx::query_as::<_, PipelineRow>(
        r#"
        SELECT id, name, description, created_at, updated_at
        FROM pipelines
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut steps = find_steps(pool, &[id]).await?;
    Ok(Some(row.into_pipeline(steps.remove(&id).unwrap_or_default())))
}

/// List pipelines, newest first
pub async fn list(pool: &PgPool, page: Pagination) -> Result<Vec<Pipeline>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PipelineRow>(
        r#"
        SELECT id, name, description, created_at, updated_at
        FROM pipelines
        ORDER BY created_at DESC
        OFFSET $1 LIMIT $2
        "#,
    )
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut steps = find_steps(pool, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let own = steps.remove(&row.id).unwrap_or_default();
            row.into_pipeline(own)
        })
        .collect())
}

/// Whether a pipeline with this ID exists
pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM pipelines WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Update a pipeline
///
/// When `steps` is given it replaces the whole step list. Returns `false` if
/// the pipeline does not exist.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
    steps: Option<&[PipelineStep]>,
) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE pipelines
        SET name = COALESCE($1, name),
            description = COALESCE($2, description),
            updated_at = $3
        WHERE id = $4
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    if let Some(steps) = steps {
        sqlx::query("DELETE FROM pipeline_steps WHERE pipeline_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_steps(&mut tx, id, steps).await?;
    }

    tx.commit().await?;
    Ok(true)
}

/// Delete a pipeline by ID
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pipelines WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_steps(
    tx: &mut Transaction<'_, Postgres>,
    pipeline_id: Uuid,
    steps: &[PipelineStep],
) -> Result<(), sqlx::Error> {
    for step in steps {
        sqlx::query(
            r#"
            INSERT INTO pipeline_steps (
                pipeline_id, step_order, template_id, provider, model, output_variable
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(pipeline_id)
        .bind(step.order as i32)
        .bind(step.template_id)
        .bind(&step.provider)
        .bind(&step.model)
        .bind(&step.output_variable)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Steps of the given pipelines, grouped by pipeline and in step order
async fn find_steps(
    pool: &PgPool,
    pipeline_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<PipelineStep>>, sqlx::Error> {
    if pipeline_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, PipelineStepRow>(
        r#"
        SELECT pipeline_id, step_order, template_id, provider, model, output_variable
        FROM pipeline_steps
        WHERE pipeline_id = ANY($1)
        ORDER BY pipeline_id, step_order ASC
        "#,
    )
    .bind(pipeline_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<PipelineStep>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.pipeline_id)
            .or_default()
            .push(row.into());
    }

    Ok(grouped)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct PipelineRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl PipelineRow {
    fn into_pipeline(self, steps: Vec<PipelineStep>) -> Pipeline {
        Pipeline {
            id: self.id,
            name: self.name,
            description: self.description,
            steps,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PipelineStepRow {
    pipeline_id: Uuid,
    step_order: i32,
    template_id: Uuid,
    provider: String,
    model: String,
    output_variable: String,
}

impl From<PipelineStepRow> for PipelineStep {
    fn from(row: PipelineStepRow) -> Self {
        PipelineStep {
            order: row.step_order as u32,
            template_id: row.template_id,
            provider: row.provider,
            model: row.model,
            output_variable: row.output_variable,
        }
    }
}
