//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into pipeline values at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AccessConfig, AuthConfig, AuthorizationConfig, AuthorizationRuleConfig, CorsConfig,
    FilterConfig, GatewayConfig, IssuerConfig, ListenerConfig, ObservabilityConfig, RouteConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
