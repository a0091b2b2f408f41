//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// One entry per protected dependency.
    pub breakers: Vec<BreakerConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            observability: ObservabilityConfig::default(),
            breakers: vec![BreakerConfig::default()],
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter (e.g. "info", "command_breaker=debug").
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Configuration of a single breaker.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Breaker identifier for logging/metrics.
    pub name: String,

    /// Default command timeout in milliseconds.
    pub timeout_ms: u64,

    /// Maximum concurrently executing commands.
    pub capacity: usize,

    /// Recovery probe interval in milliseconds.
    pub probe_interval_ms: u64,
}

impl BreakerConfig {
    pub fn new(name: impl Into<String>, timeout: Duration, capacity: usize) -> Self {
        Self {
            name: name.into(),
            timeout_ms: timeout.as_millis() as u64,
            capacity,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            timeout_ms: 1000,
            capacity: 10,
            probe_interval_ms: 100,
        }
    }
}
