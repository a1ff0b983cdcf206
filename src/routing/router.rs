//! Compiled host router table.
//!
//! # Design Decisions
//! - Built once before the listener starts; read-only afterwards
//! - Shared via `Arc` between request tasks without locks
//! - Lookup falls back to the default chain, then to not-found

use std::collections::HashMap;

use crate::http::response::not_found_handler;
use crate::routing::chain::{HostChains, DEFAULT_HOST};
use crate::routing::handler::Handler;
use crate::routing::registration::MiddlewareRegistration;

/// Host key → composed handler.
#[derive(Debug, Clone)]
pub struct RouterTable {
    handlers: HashMap<String, Handler>,
    not_found: Handler,
}

impl RouterTable {
    pub(crate) fn new(handlers: HashMap<String, Handler>, not_found: Handler) -> Self {
        Self {
            handlers,
            not_found,
        }
    }

    /// Compile registrations into a table terminating in the not-found handler.
    pub fn build(registrations: &[MiddlewareRegistration]) -> Self {
        let chains = HostChains::resolve(registrations);
        chains.log_layout();

        let table = chains.compose(&not_found_handler());
        tracing::info!(
            registrations = registrations.len(),
            hosts = table.handlers.len(),
            "Router table built"
        );
        table
    }

    /// Handler registered for exactly `host`.
    pub fn get(&self, host: &str) -> Option<&Handler> {
        self.handlers.get(host)
    }

    /// Resolve `host` to a handler and the key that matched.
    ///
    /// Returns `None` as the key when neither the host nor the default chain
    /// exists and the not-found handler is used.
    pub fn resolve(&self, host: &str) -> (&Handler, Option<&str>) {
        if let Some((key, handler)) = self.handlers.get_key_value(host) {
            return (handler, Some(key.as_str()));
        }
        if let Some((key, handler)) = self.handlers.get_key_value(DEFAULT_HOST) {
            return (handler, Some(key.as_str()));
        }
        (&self.not_found, None)
    }

    /// Registered host keys, including `""` when a default chain exists.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
