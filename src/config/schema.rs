//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files. Every
//! duration is expressed in whole seconds (or milliseconds where noted) and a
//! value of `0` disables the corresponding limit.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, TLS, header limits).
    pub listener: ListenerConfig,

    /// Per-connection timeouts.
    pub timeouts: TimeoutConfig,

    /// Graceful shutdown budgets.
    pub shutdown: ShutdownConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address, e.g. `"0.0.0.0:8080"` or `":8443"`. Empty picks a default
    /// port depending on whether TLS is configured.
    pub address: String,

    /// Optional TLS certificate and key files.
    pub tls: Option<TlsConfig>,

    /// Maximum size of the request head in bytes.
    pub max_header_bytes: usize,

    /// How long to watch a freshly started listener for immediate failures.
    pub startup_window_ms: u64,

    /// Self-signed fallback certificate lifetime in hours.
    pub self_signed_validity_hours: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            tls: None,
            max_header_bytes: 4096,
            startup_window_ms: 3000,
            self_signed_validity_hours: 24,
        }
    }
}

impl ListenerConfig {
    pub fn startup_window(&self) -> Duration {
        Duration::from_millis(self.startup_window_ms)
    }

    pub fn self_signed_validity(&self) -> Duration {
        Duration::from_secs(self.self_signed_validity_hours.saturating_mul(3600))
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Connection timeouts.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to receive a full request body, in milliseconds.
    pub read_ms: u64,

    /// Time allowed to receive the request head, in milliseconds.
    pub read_header_ms: u64,

    /// Time allowed to produce the response, in milliseconds.
    pub write_ms: u64,

    /// Keep-alive ping interval for HTTP/2 connections, in milliseconds.
    /// HTTP/1 keep-alive connections are not closed for idleness.
    pub idle_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_ms: 18_000_000,
            read_header_ms: 10_000,
            write_ms: 18_000_000,
            idle_ms: 1_800_000,
        }
    }
}

impl TimeoutConfig {
    pub fn read(&self) -> Option<Duration> {
        non_zero_millis(self.read_ms)
    }

    pub fn read_header(&self) -> Option<Duration> {
        non_zero_millis(self.read_header_ms)
    }

    pub fn write(&self) -> Option<Duration> {
        non_zero_millis(self.write_ms)
    }

    pub fn idle(&self) -> Option<Duration> {
        non_zero_millis(self.idle_ms)
    }
}

/// Graceful shutdown budgets.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Overall deadline for draining connections, in milliseconds.
    pub timeout_ms: u64,

    /// Time in-flight requests get before they are force-cancelled, in
    /// milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3_600_000,
            request_timeout_ms: 15_000,
        }
    }
}

impl ShutdownConfig {
    pub fn timeout(&self) -> Option<Duration> {
        non_zero_millis(self.timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.request_timeout_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format: `pretty`, `json` or `compact`.
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

fn non_zero_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.listener.address, "");
        assert_eq!(config.listener.max_header_bytes, 4096);
        assert_eq!(config.listener.startup_window(), Duration::from_secs(3));
        assert_eq!(config.timeouts.read(), Some(Duration::from_secs(18_000)));
        assert_eq!(config.timeouts.read_header(), Some(Duration::from_secs(10)));
        assert_eq!(config.timeouts.idle(), Some(Duration::from_secs(1800)));
        assert_eq!(config.shutdown.timeout(), Some(Duration::from_secs(3600)));
        assert_eq!(config.shutdown.request_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn zero_disables_durations() {
        let shutdown = ShutdownConfig {
            timeout_ms: 0,
            request_timeout_ms: 0,
        };
        assert_eq!(shutdown.timeout(), None);
        assert_eq!(shutdown.request_timeout(), None);
    }

    #[test]
    fn huge_validity_saturates() {
        let listener = ListenerConfig {
            self_signed_validity_hours: u64::MAX,
            ..ListenerConfig::default()
        };
        assert_eq!(listener.self_signed_validity(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn sub_second_timeouts_from_toml() {
        let config: ServerConfig = toml::from_str(
            r#"
            [timeouts]
            read_header_ms = 1500
            idle_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.timeouts.read_header(), Some(Duration::from_millis(1500)));
        assert_eq!(config.timeouts.idle(), None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [listener]
            address = "127.0.0.1:9000"

            [shutdown]
            request_timeout_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.address, "127.0.0.1:9000");
        assert_eq!(config.listener.max_header_bytes, 4096);
        assert_eq!(config.shutdown.request_timeout(), Some(Duration::from_secs(2)));
        assert_eq!(config.shutdown.timeout_ms, 3_600_000);
    }
}
