//! Provider gateway
//!
//! An [`LlmProvider`] adapts one LLM backend. The [`ProviderGateway`] is the
//! single capability the engine calls through: it routes a
//! `(provider, model, prompt)` triple to the right adapter and owns any
//! backpressure on outbound calls.

pub mod anthropic;
pub mod mock;
pub mod openai;
pub mod registry;

use async_trait::async_trait;
use promptlab_core::domain::provider::ProviderInfo;
use std::time::Duration;
use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use registry::ProviderRegistry;

/// Errors raised while invoking a provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error (HTTP {status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("provider call timed out after {}", format_timeout(.0))]
    Timeout(Duration),

    #[error("execution cancelled")]
    Cancelled,
}

/// One LLM backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Name steps use to select this provider
    fn name(&self) -> &str;

    /// Models this provider advertises
    fn models(&self) -> Vec<String>;

    /// Generate a completion for a fully rendered prompt
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// Routes prompts to providers
///
/// Must be safe for concurrent use by any number of in-flight runs.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    async fn invoke(&self, provider: &str, model: &str, prompt: &str)
    -> Result<String, ProviderError>;

    /// Providers available to steps, with their models
    fn list_providers(&self) -> Vec<ProviderInfo>;

    /// Whether a step naming `provider` can be routed
    fn knows(&self, provider: &str) -> bool {
        self.list_providers().iter().any(|p| p.name == provider)
    }
}

/// First `limit` characters of a string, on a char boundary
pub(crate) fn truncate_chars(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Whole seconds as `30s`, anything finer as `1500ms`
fn format_timeout(timeout: &Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}
