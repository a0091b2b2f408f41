//! Named breaker registry.
//!
//! # Responsibilities
//! - Build one breaker per configured dependency
//! - Look breakers up by name from any task
//! - Shut breakers down when removed or when the host stops

use std::sync::Arc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

use crate::config::BreakerConfig;
use crate::observability::EventSink;
use crate::resilience::circuit_breaker::{Breaker, BreakerSnapshot};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("breaker '{0}' is already registered")]
    Duplicate(String),
}

/// Concurrent map of breaker name → breaker, sharing one event sink.
pub struct BreakerRegistry {
    breakers: DashMap<String, Breaker>,
    sink: Arc<dyn EventSink>,
}

impl BreakerRegistry {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            breakers: DashMap::new(),
            sink,
        }
    }

    /// Build a registry from configuration. Duplicate names keep the first entry.
    pub fn from_config(configs: &[BreakerConfig], sink: Arc<dyn EventSink>) -> Self {
        let registry = Self::new(sink);
        for config in configs {
            if let Err(e) = registry.register(config) {
                tracing::warn!(error = %e, "Ignoring breaker configuration");
            }
        }
        registry
    }

    /// Create and register a breaker.
    pub fn register(&self, config: &BreakerConfig) -> Result<Breaker, RegistryError> {
        match self.breakers.entry(config.name.clone()) {
            Entry::Occupied(_) => Err(RegistryError::Duplicate(config.name.clone())),
            Entry::Vacant(slot) => {
                let breaker = Breaker::from_config(config, self.sink.clone());
                slot.insert(breaker.clone());
                tracing::info!(
                    breaker = %config.name,
                    capacity = config.capacity,
                    timeout_ms = config.timeout_ms,
                    "Breaker registered"
                );
                Ok(breaker)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Breaker> {
        self.breakers.get(name).map(|entry| entry.value().clone())
    }

    /// Unregister a breaker and shut it down.
    pub fn remove(&self, name: &str) -> Option<Breaker> {
        let (_, breaker) = self.breakers.remove(name)?;
        breaker.shutdown();
        Some(breaker)
    }

    /// Snapshots of all breakers, sorted by name.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<_> = self.breakers.iter().map(|entry| entry.value().snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn shutdown_all(&self) {
        for entry in self.breakers.iter() {
            entry.value().shutdown();
        }
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
