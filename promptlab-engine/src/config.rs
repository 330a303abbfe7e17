//! Engine configuration
//!
//! Tunables for a [`PipelineEngine`](crate::PipelineEngine). Backpressure on the
//! outbound provider calls is configured on the gateway, not here.

use std::time::Duration;

/// Default upper bound for one provider call
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(120);

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum time a single provider invocation may take before the step
    /// is failed with a timeout error
    ///
    /// Includes any wait for a free slot in a rate-limited gateway.
    pub step_timeout: Duration,
}

impl EngineConfig {
    /// Creates a configuration with defaults
    pub fn new() -> Self {
        Self {
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.step_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_with_step_timeout() {
        let config = EngineConfig::new().with_step_timeout(Duration::from_millis(250));
        assert_eq!(config.step_timeout, Duration::from_millis(250));
    }
}
