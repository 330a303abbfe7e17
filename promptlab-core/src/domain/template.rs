//! Template domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::placeholder;

/// A named, versioned prompt template
///
/// Content is immutable per version; edits create a new version and
/// `latest_version` always holds the highest `version_number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub latest_version: TemplateVersion,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Template {
    /// Content of the newest version
    pub fn latest_content(&self) -> &str {
        &self.latest_version.content
    }

    /// Placeholder names referenced by the newest version
    pub fn variables(&self) -> Vec<String> {
        placeholder::extract_variables(self.latest_content())
    }
}

/// One immutable revision of a template's content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub id: Uuid,
    pub template_id: Uuid,
    pub version_number: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_variables_come_from_latest_version() {
        let id = Uuid::new_v4();
        let template = Template {
            id,
            name: "greeting".to_string(),
            description: None,
            latest_version: TemplateVersion {
                id: Uuid::new_v4(),
                template_id: id,
                version_number: 3,
                content: "Hello {{name}} from {{city}}, {{name}}".to_string(),
                created_at: Utc::now(),
            },
            created_at: Utc::now(),
            updated_at: None,
        };

        assert_eq!(template.variables(), vec!["name", "city"]);
        assert!(template.latest_content().starts_with("Hello"));
    }
}
