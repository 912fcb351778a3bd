//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared via Arc with the accept loop and every binding
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the server is built; there is no hot reload
//!   because the protocol registry it feeds must not change while serving
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    LimitsConfig, ListenerConfig, ObservabilityConfig, ServerConfig, TimeoutConfig, TlsConfig,
    H2_PROTOCOL, HTTP11_PROTOCOL,
};
pub use validation::{validate_config, ValidationError};
