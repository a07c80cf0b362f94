//! Resolver configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a `Resolver`
///
/// ```ignore
/// let config = ResolverConfig::new().with_call_timeout(5_000);
/// let resolver = Resolver::with_config(source, config);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Timeout applied to every data source call, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timeout_ms: Option<u64>,

    /// Maximum number of requests resolved at once by `check_many`
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

fn default_batch_concurrency() -> usize {
    8
}

impl ResolverConfig {
    /// Create a configuration with no timeout
    pub fn new() -> Self {
        Self {
            call_timeout_ms: None,
            batch_concurrency: default_batch_concurrency(),
        }
    }

    /// Set the per-call timeout
    pub fn with_call_timeout(mut self, timeout_ms: u64) -> Self {
        self.call_timeout_ms = Some(timeout_ms);
        self
    }

    /// Set batch concurrency (clamped to at least 1)
    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    /// Get the per-call timeout as Duration
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_config_defaults() {
        let config = ResolverConfig::new();
        assert_eq!(config.call_timeout(), None);
        assert_eq!(config.batch_concurrency, 8);
    }

    #[test]
    fn test_resolver_config_builder() {
        let config = ResolverConfig::new()
            .with_call_timeout(2_500)
            .with_batch_concurrency(0);
        assert_eq!(config.call_timeout(), Some(Duration::from_millis(2_500)));
        assert_eq!(config.batch_concurrency, 1);
    }

    #[test]
    fn test_resolver_config_from_json() {
        let config: ResolverConfig = serde_json::from_str(r#"{"call_timeout_ms": 100}"#).unwrap();
        assert_eq!(config.call_timeout_ms, Some(100));
        assert_eq!(config.batch_concurrency, 8);
    }
}
