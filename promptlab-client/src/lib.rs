//! PromptLab HTTP Client
//!
//! A simple, type-safe HTTP client for the PromptLab server API.
//!
//! # Example
//!
//! ```no_run
//! use promptlab_client::PromptLabClient;
//! use promptlab_core::dto::template::CreateTemplate;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PromptLabClient::new("http://localhost:8080");
//!
//!     let template = client.create_template(CreateTemplate {
//!         name: "translate".to_string(),
//!         description: None,
//!         content: "Translate to English: {{text}}".to_string(),
//!     }).await?;
//!
//!     println!("Created template: {}", template.id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod executions;
mod pipelines;
mod providers;
mod templates;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// HTTP client for the PromptLab server API
///
/// This client provides methods for all server endpoints, organized
/// into logical groups:
/// - Template management and versions
/// - Pipeline management and execution
/// - Single-template executions and execution history
/// - Provider discovery
#[derive(Debug, Clone)]
pub struct PromptLabClient {
    /// Base URL of the server (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

/// Error body rendered by the server
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl PromptLabClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use promptlab_client::PromptLabClient;
    ///
    /// let client = PromptLabClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    /// Pipeline runs block until every step has finished, so a generous
    /// timeout is advisable.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., DELETE operations)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await?;
        Ok(())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ErrorBody>(&error_text)
            .map(|body| body.error)
            .unwrap_or(error_text);

        tracing::debug!("API request failed with status {}: {}", status, message);

        Err(ClientError::api_error(status.as_u16(), message))
    }
}
