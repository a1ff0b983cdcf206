//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and address syntax
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let address = config.listener.address.trim();
    if !address.is_empty() && !looks_like_bind_address(address) {
        errors.push(ValidationError::new(
            "listener.address",
            format!("expected host:port or :port, got {:?}", address),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
        }
    }

    if config.listener.max_header_bytes == 0 {
        errors.push(ValidationError::new(
            "listener.max_header_bytes",
            "must be greater than zero",
        ));
    }

    if config.listener.startup_window_ms == 0 {
        errors.push(ValidationError::new(
            "listener.startup_window_ms",
            "must be greater than zero",
        ));
    }

    if config.listener.self_signed_validity_hours == 0 {
        errors.push(ValidationError::new(
            "listener.self_signed_validity_hours",
            "must be greater than zero",
        ));
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" | "compact" => {}
        other => errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format {:?}", other),
        )),
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port`, `[v6]:port` or `:port` with a numeric port.
fn looks_like_bind_address(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => port.parse::<u16>().is_ok() && !host.contains(char::is_whitespace),
        None => false,
    }
}
