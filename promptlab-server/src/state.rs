//! Shared application state
//!
//! Built once at startup and cloned into every request handler.

use promptlab_engine::provider::{AnthropicProvider, MockProvider, OpenAiProvider};
use promptlab_engine::{EngineConfig, ExecutionStore, PipelineEngine, ProviderGateway, ProviderRegistry};
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::{AppEnv, Config};
use crate::store::{PgExecutionStore, PgTemplateStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub engine: Arc<PipelineEngine>,
    pub gateway: Arc<dyn ProviderGateway>,
    pub executions: Arc<dyn ExecutionStore>,
}

impl AppState {
    /// Wire the Postgres stores and the provider registry into an engine
    pub fn new(pool: PgPool, config: &Config) -> Self {
        let gateway: Arc<dyn ProviderGateway> = Arc::new(build_gateway(config));
        let executions: Arc<dyn ExecutionStore> = Arc::new(PgExecutionStore::new(pool.clone()));

        let engine = PipelineEngine::new(
            Arc::new(PgTemplateStore::new(pool.clone())),
            gateway.clone(),
            executions.clone(),
        )
        .with_config(EngineConfig::new().with_step_timeout(config.step_timeout));

        Self {
            pool,
            engine: Arc::new(engine),
            gateway,
            executions,
        }
    }
}

/// Provider registry for the configured environment
///
/// In the `test` environment every provider name is served by the mock
/// provider so that no request leaves the process.
pub fn build_gateway(config: &Config) -> ProviderRegistry {
    let registry = ProviderRegistry::new(config.max_concurrent_provider_requests);

    if config.app_env == AppEnv::Test {
        tracing::info!("APP_ENV=test: all providers resolve to the mock provider");
        return registry
            .register(MockProvider::new())
            .with_fallback(MockProvider::new());
    }

    if config.anthropic_api_key.is_none() {
        tracing::warn!("ANTHROPIC_API_KEY is not set; anthropic steps will fail");
    }
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; openai steps will fail");
    }

    registry
        .register(AnthropicProvider::new(
            config.anthropic_api_key.clone().unwrap_or_default(),
        ))
        .register(OpenAiProvider::new(
            config.openai_api_key.clone().unwrap_or_default(),
        ))
        .register(MockProvider::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(app_env: AppEnv) -> Config {
        let mut config = Config::new("postgres://localhost/promptlab".to_string());
        config.app_env = app_env;
        config
    }

    #[test]
    fn test_gateway_lists_builtin_providers() {
        let gateway = build_gateway(&config(AppEnv::Development));
        let names: Vec<_> = gateway
            .list_providers()
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["anthropic", "mock", "openai"]);
        assert!(!gateway.knows("cohere"));
    }

    #[tokio::test]
    async fn test_test_env_routes_everything_to_mock() {
        let gateway = build_gateway(&config(AppEnv::Test));

        assert!(gateway.knows("anthropic"));
        let out = gateway
            .invoke("anthropic", "claude-sonnet-4-5-20250929", "hello")
            .await
            .unwrap();
        assert_eq!(out, "Mock response for: hello");
    }
}
