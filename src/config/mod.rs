//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig
//!
//! ServerConfig + registrations + option functions
//!     → options.rs (ServerBuilder folds them in order)
//!     → Options (immutable snapshot handed to the server)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once handed to the server
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Zero durations disable the corresponding limit

pub mod loader;
pub mod options;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use options::{Options, ServerBuilder, ServerOption};
pub use schema::{ListenerConfig, ServerConfig, ShutdownConfig, TimeoutConfig, TlsConfig};
