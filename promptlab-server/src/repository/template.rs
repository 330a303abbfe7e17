//! Template Repository
//!
//! Handles all database operations related to templates and their versions.

use promptlab_core::domain::template::{Template, TemplateVersion};
use promptlab_core::dto::Pagination;
use promptlab_core::dto::template::{CreateTemplate, UpdateTemplate};
use sqlx::PgPool;
use uuid::Uuid;

const SELECT_WITH_LATEST_VERSION: &str = r#"
    SELECT t.id, t.name, t.description, t.created_at, t.updated_at,
           v.id AS version_id, v.version_number, v.content,
           v.created_at AS version_created_at
    FROM templates t
    JOIN LATERAL (
        SELECT id, version_number, content, created_at
        FROM template_versions
        WHERE template_id = t.id
        ORDER BY version_number DESC
        LIMIT 1
    ) v ON TRUE
"#;

/// Create a new template together with its first version
pub async fn create(pool: &PgPool, req: &CreateTemplate) -> Result<Template, sqlx::Error> {
    let id = Uuid::new_v4();
    let version_id = Uuid::new_v4();
    let now = chrono::Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO templates (id, name, description, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO template_versions (id, template_id, version_number, content, created_at)
        VALUES ($1, $2, 1, $3, $4)
        "#,
    )
    .bind(version_id)
    .bind(id)
    .bind(&req.content)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Template {
        id,
        name: req.name.clone(),
        description: req.description.clone(),
        latest_version: TemplateVersion {
            id: version_id,
            template_id: id,
            version_number: 1,
            content: req.content.clone(),
            created_at: now,
        },
        created_at: now,
        updated_at: None,
    })
}

/// Find a template by ID, with its latest version
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Template>, sqlx::Error> {
    let row = sqlx::query_as::<_, TemplateRow>(&format!(
        "{} WHERE t.id = $1",
        SELECT_WITH_LATEST_VERSION
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// List templates, newest first
pub async fn list(pool: &PgPool, page: Pagination) -> Result<Vec<Template>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TemplateRow>(&format!(
        "{} ORDER BY t.created_at DESC OFFSET $1 LIMIT $2",
        SELECT_WITH_LATEST_VERSION
    ))
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Whether a template with this ID exists
pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM templates WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Update a template
///
/// Name and description are edited in place; new content is appended as the
/// next version. Returns `false` if the template does not exist.
pub async fn update(pool: &PgPool, id: Uuid, req: &UpdateTemplate) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE templates
        SET name = COALESCE($1, name),
            description = COALESCE($2, description),
            updated_at = $3
        WHERE id = $4
        "#,
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    if let Some(content) = &req.content {
        sqlx::query(
            r#"
            INSERT INTO template_versions (id, template_id, version_number, content, created_at)
            SELECT $1, $2, COALESCE(MAX(version_number), 0) + 1, $3, $4
            FROM template_versions
            WHERE template_id = $2
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(content)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(true)
}

/// Delete a template and all of its versions
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM templates WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// All versions of a template, highest version first
pub async fn list_versions(
    pool: &PgPool,
    template_id: Uuid,
) -> Result<Vec<TemplateVersion>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TemplateVersionRow>(
        r#"
        SELECT id, template_id, version_number, content, created_at
        FROM template_versions
        WHERE template_id = $1
        ORDER BY version_number DESC
        "#,
    )
    .bind(template_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: Option<chrono::DateTime<chrono::Utc>>,
    version_id: Uuid,
    version_number: i32,
    content: String,
    version_created_at: chrono::DateTime<chrono::Utc>,
}

impl From<TemplateRow> for Template {
    fn from(row: TemplateRow) -> Self {
        Template {
            id: row.id,
            name: row.name,
            description: row.description,
            latest_version: TemplateVersion {
                id: row.version_id,
                template_id: row.id,
                version_number: row.version_number,
                content: row.content,
                created_at: row.version_created_at,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TemplateVersionRow {
    id: Uuid,
    template_id: Uuid,
    version_number: i32,
    content: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<TemplateVersionRow> for TemplateVersion {
    fn from(row: TemplateVersionRow) -> Self {
        TemplateVersion {
            id: row.id,
            template_id: row.template_id,
            version_number: row.version_number,
            content: row.content,
            created_at: row.created_at,
        }
    }
}
