//! Name-based provider routing

use async_trait::async_trait;
use promptlab_core::domain::provider::ProviderInfo;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::{LlmProvider, ProviderError, ProviderGateway};

/// Default bound on concurrent outbound provider calls
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 8;

/// Gateway over a fixed set of providers
///
/// Every call holds a permit of a shared semaphore for its duration, so the
/// number of in-flight requests across all runs never exceeds the configured
/// bound. Callers queue for a permit; nothing is rejected.
///
/// Time spent queued is part of the call as seen by the caller, so a step
/// timeout applied around [`ProviderGateway::invoke`] also covers the wait. Under
/// sustained backpressure a step can time out before its provider is reached.
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn LlmProvider>>,
    fallback: Option<Arc<dyn LlmProvider>>,
    limiter: Semaphore,
}

impl ProviderRegistry {
    pub fn new(max_concurrent_requests: usize) -> Self {
        Self {
            providers: BTreeMap::new(),
            fallback: None,
            limiter: Semaphore::new(max_concurrent_requests.max(1)),
        }
    }

    /// Register a provider under its own name, replacing any previous one
    pub fn register(mut self, provider: impl LlmProvider + 'static) -> Self {
        self.providers
            .insert(provider.name().to_string(), Arc::new(provider));
        self
    }

    /// Route every name without a registered provider to `provider`
    pub fn with_fallback(mut self, provider: impl LlmProvider + 'static) -> Self {
        self.fallback = Some(Arc::new(provider));
        self
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.providers
            .get(name)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(name.to_string()))
    }

    /// Permits currently free
    pub fn available_permits(&self) -> usize {
        self.limiter.available_permits()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT_REQUESTS)
    }
}

#[async_trait]
impl ProviderGateway for ProviderRegistry {
    async fn invoke(
        &self,
        provider: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let backend = self.resolve(provider)?;

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| ProviderError::Cancelled)?;

        tracing::debug!(
            "Invoking provider {} (requested {}) with model {}",
            backend.name(),
            provider,
            model
        );

        backend.complete(model, prompt).await
    }

    fn list_providers(&self) -> Vec<ProviderInfo> {
        self.providers
            .values()
            .map(|p| ProviderInfo {
                name: p.name().to_string(),
                models: p.models(),
            })
            .collect()
    }

    fn knows(&self, provider: &str) -> bool {
        self.fallback.is_some() || self.providers.contains_key(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AnthropicProvider, MockProvider, OpenAiProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Records the highest number of overlapping calls
    struct SlowProvider {
        active: AtomicUsize,
        peak: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
    }

    impl SlowProvider {
        fn new(peak: Arc<AtomicUsize>, calls: Arc<AtomicUsize>) -> Self {
            Self {
                active: AtomicUsize::new(0),
                peak,
                calls,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        fn models(&self) -> Vec<String> {
            vec!["slow-1".to_string()]
        }

        async fn complete(&self, _model: &str, prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(prompt.to_string())
        }
    }

    #[tokio::test]
    async fn test_routes_by_name() {
        let registry = ProviderRegistry::default().register(MockProvider::new());

        let out = registry.invoke("mock", "mock-model", "ping").await.unwrap();
        assert_eq!(out, "Mock response for: ping");

        let err = registry.invoke("nope", "m", "ping").await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider(ref name) if name == "nope"));
        assert!(registry.knows("mock"));
        assert!(!registry.knows("nope"));
    }

    #[tokio::test]
    async fn test_fallback_serves_every_name() {
        let registry = ProviderRegistry::default().with_fallback(MockProvider::new());

        let out = registry.invoke("anthropic", "claude", "ping").await.unwrap();
        assert_eq!(out, "Mock response for: ping");
        assert!(registry.knows("anything"));
    }

    #[test]
    fn test_list_providers_sorted_with_models() {
        let registry = ProviderRegistry::default()
            .register(OpenAiProvider::new("k"))
            .register(AnthropicProvider::new("k"));

        let providers = registry.list_providers();
        let names: Vec<_> = providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["anthropic", "openai"]);
        assert_eq!(providers[1].models, vec!["gpt-4o", "gpt-4o-mini"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let peak = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(
            ProviderRegistry::new(2).register(SlowProvider::new(Arc::clone(&peak), calls)),
        );

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry
                        .invoke("slow", "slow-1", &format!("call {}", i))
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(registry.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_queue_wait_counts_against_caller_timeout() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(ProviderRegistry::new(1).register(SlowProvider::new(
            Arc::new(AtomicUsize::new(0)),
            Arc::clone(&calls),
        )));

        let holder = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.invoke("slow", "slow-1", "first").await })
        };
        while registry.available_permits() > 0 {
            tokio::task::yield_now().await;
        }

        let queued = tokio::time::timeout(
            Duration::from_millis(5),
            registry.invoke("slow", "slow-1", "second"),
        )
        .await;

        assert!(queued.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(holder.await.unwrap().unwrap(), "first");
        assert_eq!(registry.available_permits(), 1);
    }
}
