//! Common types used across CLI modules

use anyhow::{Result, anyhow};
use promptlab_core::dto::pipeline::CreatePipelineStep;
use uuid::Uuid;

/// Identifier that can be either a full UUID or an unambiguous prefix
#[derive(Debug, Clone)]
pub enum IdOrPrefix {
    /// Full UUID
    Full(Uuid),
    /// Prefix that should uniquely identify a resource
    Prefix(String),
}

impl IdOrPrefix {
    /// Parse a string into an IdOrPrefix
    ///
    /// Attempts to parse as a full UUID first, otherwise treats as a prefix
    pub fn parse(input: &str) -> Self {
        match Uuid::parse_str(input) {
            Ok(uuid) => IdOrPrefix::Full(uuid),
            Err(_) => IdOrPrefix::Prefix(input.to_lowercase()),
        }
    }
}

/// Parse a single key=value pair
///
/// Only the first `=` splits, so values may contain `=` themselves.
pub fn parse_key_val(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    if key.is_empty() {
        return Err(anyhow!("invalid KEY=value: empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse a step given as `TEMPLATE_ID:PROVIDER:MODEL:OUTPUT_VARIABLE`
///
/// The model may itself contain `:`; provider and output variable may not.
pub fn parse_step(s: &str) -> Result<CreatePipelineStep> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 4 {
        return Err(anyhow!(
            "invalid step `{}`: expected TEMPLATE_ID:PROVIDER:MODEL:OUTPUT_VARIABLE",
            s
        ));
    }

    let template_id = Uuid::parse_str(parts[0])
        .map_err(|e| anyhow!("invalid template ID `{}`: {}", parts[0], e))?;
    let last = parts.len() - 1;

    Ok(CreatePipelineStep {
        template_id,
        provider: parts[1].to_string(),
        model: parts[2..last].join(":"),
        output_variable: parts[last].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_or_prefix() {
        let id = Uuid::new_v4();
        assert!(matches!(IdOrPrefix::parse(&id.to_string()), IdOrPrefix::Full(u) if u == id));
        assert!(matches!(IdOrPrefix::parse("AB12"), IdOrPrefix::Prefix(p) if p == "ab12"));
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("text=a=b").unwrap(),
            ("text".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_key_val("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_parse_step() {
        let id = Uuid::new_v4();
        let step = parse_step(&format!("{}:openai:gpt-4o:translation", id)).unwrap();
        assert_eq!(step.template_id, id);
        assert_eq!(step.provider, "openai");
        assert_eq!(step.model, "gpt-4o");
        assert_eq!(step.output_variable, "translation");

        let step = parse_step(&format!("{}:local:llama3:8b:summary", id)).unwrap();
        assert_eq!(step.model, "llama3:8b");
        assert_eq!(step.output_variable, "summary");

        assert!(parse_step("not-a-uuid:mock:mock-model:out").is_err());
        assert!(parse_step(&format!("{}:mock:out", id)).is_err());
    }
}
