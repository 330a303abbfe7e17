//! Configuration module
//!
//! Handles CLI configuration including the server URL and request timeout.

use std::time::Duration;

use anyhow::{Context, Result};
use promptlab_client::PromptLabClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the PromptLab server
    pub server_url: String,
    /// Upper bound for a single HTTP request
    pub timeout_secs: u64,
}

impl Config {
    /// Build an API client for the configured server
    pub fn client(&self) -> Result<PromptLabClient> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(PromptLabClient::with_client(&self.server_url, http))
    }
}
