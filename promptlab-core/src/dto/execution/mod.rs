//! Execution DTOs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Request to run a single template once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteTemplate {
    pub template_id: Uuid,
    pub provider: String,
    pub model: String,
    pub variables: HashMap<String, String>,
}
