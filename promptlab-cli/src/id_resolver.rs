//! ID resolver module
//!
//! Handles resolution of UUID prefixes to full UUIDs by querying the API.
//! This allows users to specify short, unambiguous prefixes instead of full UUIDs.

use anyhow::{Context, Result, anyhow};
use promptlab_client::PromptLabClient;
use promptlab_core::dto::{MAX_LIMIT, Pagination};
use std::future::Future;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a template ID or prefix to a full UUID
pub async fn resolve_template_id(client: &PromptLabClient, id: &str) -> Result<Uuid> {
    resolve(IdOrPrefix::parse(id), "template", |page| async move {
        client
            .list_templates(page)
            .await
            .map(|templates| templates.into_iter().map(|t| t.id).collect::<Vec<_>>())
    })
    .await
}

/// Resolve a pipeline ID or prefix to a full UUID
pub async fn resolve_pipeline_id(client: &PromptLabClient, id: &str) -> Result<Uuid> {
    resolve(IdOrPrefix::parse(id), "pipeline", |page| async move {
        client
            .list_pipelines(page)
            .await
            .map(|pipelines| pipelines.into_iter().map(|p| p.id).collect::<Vec<_>>())
    })
    .await
}

/// Resolve a pipeline execution ID or prefix to a full UUID
pub async fn resolve_pipeline_execution_id(client: &PromptLabClient, id: &str) -> Result<Uuid> {
    resolve(IdOrPrefix::parse(id), "pipeline execution", |page| async move {
        client
            .list_all_pipeline_executions(page)
            .await
            .map(|executions| executions.into_iter().map(|e| e.id).collect::<Vec<_>>())
    })
    .await
}

/// Resolve a template execution ID or prefix to a full UUID
pub async fn resolve_template_execution_id(client: &PromptLabClient, id: &str) -> Result<Uuid> {
    resolve(IdOrPrefix::parse(id), "execution", |page| async move {
        client
            .list_template_executions(page)
            .await
            .map(|executions| executions.into_iter().map(|e| e.id).collect::<Vec<_>>())
    })
    .await
}

/// Walk every page of a listing and match the prefix against the IDs
///
/// Full UUIDs are returned without touching the API.
async fn resolve<F, Fut>(id_or_prefix: IdOrPrefix, kind: &str, mut fetch: F) -> Result<Uuid>
where
    F: FnMut(Pagination) -> Fut,
    Fut: Future<Output = promptlab_client::Result<Vec<Uuid>>>,
{
    let prefix = match id_or_prefix {
        IdOrPrefix::Full(uuid) => return Ok(uuid),
        IdOrPrefix::Prefix(prefix) => prefix,
    };

    let mut ids = Vec::new();
    let mut page = Pagination {
        skip: 0,
        limit: MAX_LIMIT,
    };
    loop {
        let batch = fetch(page)
            .await
            .with_context(|| format!("Failed to fetch {}s for ID resolution", kind))?;
        let done = (batch.len() as i64) < page.limit;
        ids.extend(batch);
        if done {
            break;
        }
        page.skip += page.limit;
    }

    match_prefix(kind, &prefix, &ids)
}

fn match_prefix(kind: &str, prefix: &str, ids: &[Uuid]) -> Result<Uuid> {
    let matches: Vec<&Uuid> = ids
        .iter()
        .filter(|id| id.to_string().starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!(
            "No {} found with ID starting with '{}'",
            kind,
            prefix
        )),
        [only] => Ok(**only),
        _ => {
            let ids: Vec<String> = matches.iter().map(|id| id.to_string()).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple {}s: {}",
                prefix,
                kind,
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_prefix() {
        let a = Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000001").unwrap();
        let b = Uuid::parse_str("a1ffffff-0000-4000-8000-000000000002").unwrap();
        let ids = [a, b];

        assert_eq!(match_prefix("template", "a1b", &ids).unwrap(), a);
        assert!(match_prefix("template", "ff", &ids).is_err());

        let err = match_prefix("template", "a1", &ids).unwrap_err();
        assert!(err.to_string().starts_with("Ambiguous prefix 'a1'"));
    }

    #[tokio::test]
    async fn test_resolve_walks_pages() {
        let target = Uuid::parse_str("deadbeef-0000-4000-8000-000000000000").unwrap();
        let mut calls = 0;

        let resolved = resolve(IdOrPrefix::parse("deadbeef"), "pipeline", |page| {
            calls += 1;
            async move {
                let ids: Vec<Uuid> = if page.skip == 0 {
                    (0..page.limit).map(|_| Uuid::new_v4()).collect()
                } else {
                    vec![target]
                };
                Ok::<_, promptlab_client::ClientError>(ids)
            }
        })
        .await;

        // Random v4 IDs never start with "deadbeef" in practice
        assert_eq!(resolved.unwrap(), target);
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_full_uuid_skips_lookup() {
        let id = Uuid::new_v4();
        let resolved = resolve(IdOrPrefix::Full(id), "template", |_| async {
            Err::<Vec<Uuid>, _>(promptlab_client::ClientError::api_error(500, "unreachable"))
        })
        .await;

        assert_eq!(resolved.unwrap(), id);
    }
}
