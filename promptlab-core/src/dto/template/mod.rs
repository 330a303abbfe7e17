//! Template DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create a new template (its first version)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub description: Option<String>,
    pub content: String,
}

/// Partial update of a template
///
/// `content`, when present, creates a new version instead of editing the
/// current one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

/// Placeholder names referenced by a template's latest version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateVariables {
    pub template_id: Uuid,
    pub version_number: i32,
    pub variables: Vec<String>,
}
