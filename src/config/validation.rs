//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, capacity > 0)
//! - Detect duplicate breaker names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::{AppConfig, BreakerConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("breaker #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("breaker '{name}' is defined more than once")]
    DuplicateName { name: String },

    #[error("breaker '{name}' must allow at least one concurrent command")]
    ZeroCapacity { name: String },

    #[error("breaker '{name}' must have a non-zero timeout")]
    ZeroTimeout { name: String },

    #[error("breaker '{name}' must have a non-zero probe interval")]
    ZeroProbeInterval { name: String },

    #[error("invalid log filter '{filter}'")]
    LogLevel { filter: String },
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel {
            filter: config.observability.log_level.clone(),
        });
    }

    let mut seen = HashSet::new();
    for (index, breaker) in config.breakers.iter().enumerate() {
        validate_breaker(index, breaker, &mut errors);
        if !breaker.name.is_empty() && !seen.insert(breaker.name.as_str()) {
            errors.push(ValidationError::DuplicateName {
                name: breaker.name.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks for one breaker entry.
pub fn validate_breaker(index: usize, breaker: &BreakerConfig, errors: &mut Vec<ValidationError>) {
    let name = breaker.name.clone();
    if name.is_empty() {
        errors.push(ValidationError::EmptyName { index });
    }
    if breaker.capacity == 0 {
        errors.push(ValidationError::ZeroCapacity { name: name.clone() });
    }
    if breaker.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout { name: name.clone() });
    }
    if breaker.probe_interval_ms == 0 {
        errors.push(ValidationError::ZeroProbeInterval { name });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = AppConfig::default();
        config.observability.log_level = "foo=verbose".to_string();
        config.breakers = vec![
            BreakerConfig { name: "db".into(), capacity: 0, ..BreakerConfig::default() },
            BreakerConfig { name: "db".into(), timeout_ms: 0, ..BreakerConfig::default() },
            BreakerConfig { name: String::new(), probe_interval_ms: 0, ..BreakerConfig::default() },
        ];

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::LogLevel { filter: "foo=verbose".into() }));
        assert!(errors.contains(&ValidationError::ZeroCapacity { name: "db".into() }));
        assert!(errors.contains(&ValidationError::ZeroTimeout { name: "db".into() }));
        assert!(errors.contains(&ValidationError::DuplicateName { name: "db".into() }));
        assert!(errors.contains(&ValidationError::EmptyName { index: 2 }));
        assert!(errors.contains(&ValidationError::ZeroProbeInterval { name: String::new() }));
        assert_eq!(errors.len(), 6);
    }
}
