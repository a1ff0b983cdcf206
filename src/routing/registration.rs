//! Middleware registrations.

use std::fmt;

use crate::routing::handler::Middleware;

/// Host token meaning "every host".
pub const WILDCARD_HOST: &str = "*";

/// A priority-tagged, host-scoped middleware.
///
/// Lower priority numbers run first on the way in (outermost). An empty host
/// list is the same as `["*"]`.
#[derive(Clone)]
pub struct MiddlewareRegistration {
    priority: i32,
    hosts: Vec<String>,
    middleware: Middleware,
    name: Option<String>,
}

impl MiddlewareRegistration {
    /// Create a registration.
    pub fn new<I, S>(priority: i32, hosts: I, middleware: Middleware) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            priority,
            hosts: hosts.into_iter().map(Into::into).collect(),
            middleware,
            name: None,
        }
    }

    /// Attach a name used in logs.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Hosts exactly as registered.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn middleware(&self) -> &Middleware {
        &self.middleware
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Lower-cased host keys with wildcards folded into `"*"`.
    ///
    /// `""` and `"*"` both mean every host; duplicates keep their first position.
    pub fn normalized_hosts(&self) -> Vec<String> {
        if self.hosts.is_empty() {
            return vec![WILDCARD_HOST.to_string()];
        }

        let mut out: Vec<String> = Vec::with_capacity(self.hosts.len());
        for host in &self.hosts {
            let host = host.trim().to_lowercase();
            let host = if host.is_empty() {
                WILDCARD_HOST.to_string()
            } else {
                host
            };
            if !out.contains(&host) {
                out.push(host);
            }
        }
        out
    }

    /// Label for logs: the name if set, otherwise `priority:<n>`.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("priority:{}", self.priority),
        }
    }
}

impl fmt::Debug for MiddlewareRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareRegistration")
            .field("priority", &self.priority)
            .field("hosts", &self.hosts)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Create a registration for `middleware` at `priority` on `hosts`.
pub fn register<I, S>(priority: i32, hosts: I, middleware: Middleware) -> MiddlewareRegistration
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    MiddlewareRegistration::new(priority, hosts, middleware)
}
