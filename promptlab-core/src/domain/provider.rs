//! Provider domain types

use serde::{Deserialize, Serialize};

/// An LLM backend and the models it serves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub models: Vec<String>,
}
