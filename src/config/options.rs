//! Assembly of the runtime configuration object.
//!
//! [`Options`] is what the lifecycle controller consumes: the file-backed
//! [`ServerConfig`], optional ready-made TLS material and the middleware
//! registrations. [`ServerBuilder`] accumulates registrations and option
//! functions from any number of producers and folds them into `Options` in
//! the order they were added.

use std::fmt;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::loader::ConfigError;
use crate::config::schema::ServerConfig;
use crate::config::validation::validate_config;
use crate::routing::{Middleware, MiddlewareRegistration};

/// Finished configuration handed to the server.
#[derive(Clone, Default)]
pub struct Options {
    /// Settings, usually loaded from a file.
    pub config: ServerConfig,

    /// Pre-built TLS configuration; takes precedence over `config.listener.tls`.
    pub tls: Option<RustlsConfig>,

    /// Middleware registrations in the order they were added.
    pub registrations: Vec<MiddlewareRegistration>,
}

impl Options {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            tls: None,
            registrations: Vec::new(),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("config", &self.config)
            .field("tls", &self.tls.is_some())
            .field("registrations", &self.registrations)
            .finish()
    }
}

/// A deferred, fallible change to [`Options`].
pub type ServerOption = Box<dyn FnOnce(&mut Options) -> Result<(), ConfigError> + Send>;

/// Set the bind address.
pub fn addr(address: impl Into<String>) -> ServerOption {
    let address = address.into();
    Box::new(move |opts| {
        opts.config.listener.address = address;
        Ok(())
    })
}

pub fn read_timeout(timeout: Duration) -> ServerOption {
    Box::new(move |opts| {
        opts.config.timeouts.read_ms = millis(timeout);
        Ok(())
    })
}

pub fn read_header_timeout(timeout: Duration) -> ServerOption {
    Box::new(move |opts| {
        opts.config.timeouts.read_header_ms = millis(timeout);
        Ok(())
    })
}

pub fn write_timeout(timeout: Duration) -> ServerOption {
    Box::new(move |opts| {
        opts.config.timeouts.write_ms = millis(timeout);
        Ok(())
    })
}

/// HTTP/2 keep-alive ping interval. HTTP/1 connections are unaffected and stay
/// open while the client keeps them alive.
pub fn idle_timeout(timeout: Duration) -> ServerOption {
    Box::new(move |opts| {
        opts.config.timeouts.idle_ms = millis(timeout);
        Ok(())
    })
}

pub fn max_header_bytes(bytes: usize) -> ServerOption {
    Box::new(move |opts| {
        if bytes == 0 {
            return Err(ConfigError::Option("max_header_bytes must be greater than zero".into()));
        }
        opts.config.listener.max_header_bytes = bytes;
        Ok(())
    })
}

/// Serve TLS with a ready-made rustls configuration.
pub fn tls_config(tls: RustlsConfig) -> ServerOption {
    Box::new(move |opts| {
        opts.tls = Some(tls);
        Ok(())
    })
}

/// Overall drain deadline; zero disables it.
pub fn shutdown_timeout(timeout: Duration) -> ServerOption {
    Box::new(move |opts| {
        opts.config.shutdown.timeout_ms = millis(timeout);
        Ok(())
    })
}

/// Budget before in-flight requests are force-cancelled; zero disables it.
pub fn shutdown_request_timeout(timeout: Duration) -> ServerOption {
    Box::new(move |opts| {
        opts.config.shutdown.request_timeout_ms = millis(timeout);
        Ok(())
    })
}

/// Register `middleware` for `hosts` at `priority`.
pub fn handler<I, S>(hosts: I, priority: i32, middleware: Middleware) -> ServerOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let registration = MiddlewareRegistration::new(priority, hosts, middleware);
    Box::new(move |opts| {
        opts.registrations.push(registration);
        Ok(())
    })
}

fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Accumulates registrations and options, then builds [`Options`].
pub struct ServerBuilder {
    options: Options,
    pending: Vec<ServerOption>,
}

impl ServerBuilder {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            options: Options::new(config),
            pending: Vec::new(),
        }
    }

    /// Add a finished registration.
    pub fn add(mut self, registration: MiddlewareRegistration) -> Self {
        self.pending.push(Box::new(move |opts| {
            opts.registrations.push(registration);
            Ok(())
        }));
        self
    }

    /// Register `middleware` for `hosts` at `priority`.
    pub fn register<I, S>(self, priority: i32, hosts: I, middleware: Middleware) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add(MiddlewareRegistration::new(priority, hosts, middleware))
    }

    /// Queue an option; it runs during [`build`](Self::build).
    pub fn option(mut self, option: ServerOption) -> Self {
        self.pending.push(option);
        self
    }

    /// Queue several options in order.
    pub fn options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = ServerOption>,
    {
        self.pending.extend(options);
        self
    }

    /// Apply every queued option in order and validate the result.
    ///
    /// Stops at the first failing option.
    pub fn build(self) -> Result<Options, ConfigError> {
        let mut options = self.options;
        for option in self.pending {
            option(&mut options)?;
        }
        validate_config(&options.config).map_err(ConfigError::Validation)?;

        tracing::debug!(
            registrations = options.registrations.len(),
            tls = options.tls.is_some(),
            "Server options assembled"
        );
        Ok(options)
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("options", &self.options)
            .field("pending", &self.pending.len())
            .finish()
    }
}
