//! Client configuration.
//!
//! Validated once at client construction; immutable afterwards. The whole
//! struct deserializes from the operator's TOML settings file, with every
//! field optional.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Feed the bundled development server exposes.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:5001/ws";

/// Reconnect delay schedule parameters.
///
/// The delay after `n` consecutive failures is
/// `growth^min(n, max_exponent) * base_delay`, which bounds the longest
/// wait while keeping early retries fast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Base delay multiplied by the growth factor.
    pub base_delay: Duration,
    /// Exponential growth factor per failed attempt.
    pub growth: f64,
    /// Cap applied to the exponent, bounding the maximum delay.
    pub max_exponent: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(10),
            growth: 1.2,
            max_exponent: 10,
        }
    }
}

/// Connection settings for the feed client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket endpoint of the push feed.
    pub endpoint: String,
    /// How long one connection attempt may take before it counts as failed.
    pub connect_timeout: Duration,
    /// Reconnect delay schedule.
    pub backoff: BackoffConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(30),
            backoff: BackoffConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration for tests: local endpoint, tiny delays.
    pub fn testing() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:5001/ws".to_string(),
            connect_timeout: Duration::from_secs(1),
            backoff: BackoffConfig {
                base_delay: Duration::from_millis(10),
                growth: 1.2,
                max_exponent: 3,
            },
        }
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("endpoint must not be empty".to_string());
        }

        if !self.endpoint.starts_with("ws://") && !self.endpoint.starts_with("wss://") {
            return Err(format!(
                "endpoint must be a ws:// or wss:// URL, got {}",
                self.endpoint
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err("connect_timeout must be greater than 0".to_string());
        }

        if self.backoff.base_delay.is_zero() {
            return Err("backoff.base_delay must be greater than 0".to_string());
        }

        if self.backoff.growth < 1.0 {
            return Err("backoff.growth must be at least 1.0".to_string());
        }

        Ok(())
    }
}
