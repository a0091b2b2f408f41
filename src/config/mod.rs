//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → BreakerRegistry::from_config / logging::init
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; breaker capacity is fixed for its lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AppConfig;
pub use schema::BreakerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
