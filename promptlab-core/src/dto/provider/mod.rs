//! Provider DTOs

use serde::{Deserialize, Serialize};

use crate::domain::provider::ProviderInfo;

/// Response body of the provider listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderList {
    pub providers: Vec<ProviderInfo>,
}
