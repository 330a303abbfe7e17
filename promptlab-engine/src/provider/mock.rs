//! Offline provider used in tests and the `test` environment

use async_trait::async_trait;

use super::{LlmProvider, ProviderError, truncate_chars};

pub const MOCK_PROVIDER: &str = "mock";
pub const MOCK_MODEL: &str = "mock-model";

/// Echoes the first 100 characters of the prompt
#[derive(Debug, Default, Clone, Copy)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        MOCK_PROVIDER
    }

    fn models(&self) -> Vec<String> {
        vec![MOCK_MODEL.to_string()]
    }

    async fn complete(&self, _model: &str, prompt: &str) -> Result<String, ProviderError> {
        Ok(format!("Mock response for: {}", truncate_chars(prompt, 100)))
    }
}
