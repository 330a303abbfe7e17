use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Templates and their immutable versions
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS templates (
            id UUID PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            description TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS template_versions (
            id UUID PRIMARY KEY,
            template_id UUID NOT NULL REFERENCES templates(id) ON DELETE CASCADE,
            version_number INTEGER NOT NULL,
            content TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            UNIQUE (template_id, version_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Pipelines; steps reference templates by id only so that a deleted
    // template surfaces as a definition error at execution time
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipelines (
            id UUID PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            description TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_steps (
            pipeline_id UUID NOT NULL REFERENCES pipelines(id) ON DELETE CASCADE,
            step_order INTEGER NOT NULL,
            template_id UUID NOT NULL,
            provider VARCHAR(100) NOT NULL,
            model VARCHAR(255) NOT NULL,
            output_variable VARCHAR(100) NOT NULL,
            PRIMARY KEY (pipeline_id, step_order),
            UNIQUE (pipeline_id, output_variable)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Execution history outlives the pipeline it ran
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_executions (
            id UUID PRIMARY KEY,
            pipeline_id UUID NOT NULL,
            variables JSONB NOT NULL DEFAULT '{}',
            status VARCHAR(20) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            completed_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_step_executions (
            execution_id UUID NOT NULL REFERENCES pipeline_executions(id) ON DELETE CASCADE,
            step_order INTEGER NOT NULL,
            template_id UUID NOT NULL,
            input_prompt TEXT,
            output TEXT,
            error TEXT,
            status VARCHAR(20) NOT NULL,
            started_at TIMESTAMPTZ,
            completed_at TIMESTAMPTZ,
            PRIMARY KEY (execution_id, step_order)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS template_executions (
            id UUID PRIMARY KEY,
            template_id UUID NOT NULL,
            template_name VARCHAR(255) NOT NULL,
            template_version INTEGER NOT NULL,
            provider VARCHAR(100) NOT NULL,
            model VARCHAR(255) NOT NULL,
            variables JSONB NOT NULL DEFAULT '{}',
            input_prompt TEXT,
            output TEXT,
            error TEXT,
            status VARCHAR(20) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            completed_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for history queries
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_pipeline_executions_pipeline_id ON pipeline_executions(pipeline_id, created_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_pipeline_executions_created_at ON pipeline_executions(created_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_template_executions_created_at ON template_executions(created_at DESC)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
