//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config/config.json
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Config (validated, immutable)
//!     → shared via Arc with the scanner and the gateway
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup and never mutated
//! - Optional sections have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::BackendConfig;
pub use schema::Config;
pub use schema::ObservabilityConfig;
pub use schema::ProbeConfig;
pub use schema::TargetRoute;
pub use schema::TimeoutConfig;
pub use validation::ValidationError;
