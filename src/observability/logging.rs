//! Structured logging.
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - JSON format for production, pretty format for development

use tracing_subscriber::EnvFilter;

use crate::config::schema::ObservabilityConfig;

/// Log format names accepted in configuration.
pub mod format {
    pub const PRETTY: &str = "pretty";
    pub const JSON: &str = "json";
    pub const COMPACT: &str = "compact";
}

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install the global subscriber.
///
/// `level_override` (from the command line) takes precedence over the
/// configured level. Fails if a subscriber is already installed.
pub fn init(config: &ObservabilityConfig, level_override: Option<&str>) -> Result<(), InitError> {
    let level = level_override.unwrap_or(&config.log_level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.log_format.as_str() {
        format::JSON => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_current_span(true)
            .with_span_list(false)
            .try_init(),
        format::COMPACT => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(env_filter)
            .with_target(false)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(env_filter)
            .with_file(false)
            .with_line_number(false)
            .try_init(),
    }
}
