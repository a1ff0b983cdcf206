//! Per-host middleware chain resolution.
//!
//! Registrations are walked in ascending priority. A wildcard registration is
//! appended to every chain that already exists and to the default chain; a
//! host-specific registration seeds a new chain from the default chain as it
//! stands at that point of the walk. The order in which hosts were first seen
//! is tracked explicitly so nothing depends on map iteration.

use std::collections::HashMap;

use crate::routing::handler::Handler;
use crate::routing::registration::{MiddlewareRegistration, WILDCARD_HOST};
use crate::routing::router::RouterTable;

/// Key of the chain used when no host-specific chain matches.
pub const DEFAULT_HOST: &str = "";

/// Resolved middleware chains, keyed by lower-cased host.
#[derive(Debug, Default, Clone)]
pub struct HostChains {
    chains: HashMap<String, Vec<MiddlewareRegistration>>,
    order: Vec<String>,
}

impl HostChains {
    /// Resolve registrations into per-host chains.
    pub fn resolve(registrations: &[MiddlewareRegistration]) -> Self {
        let mut sorted: Vec<&MiddlewareRegistration> = registrations.iter().collect();
        // Stable: equal priorities keep registration order.
        sorted.sort_by_key(|reg| reg.priority());

        let mut chains = Self::default();
        for reg in sorted {
            for host in reg.normalized_hosts() {
                if host == WILDCARD_HOST {
                    chains.append_wildcard(reg);
                } else {
                    chains.append_specific(host, reg);
                }
            }
        }
        chains
    }

    fn append_wildcard(&mut self, reg: &MiddlewareRegistration) {
        let had_default = self.chains.contains_key(DEFAULT_HOST);
        for chain in self.chains.values_mut() {
            chain.push(reg.clone());
        }
        if !had_default {
            self.insert(DEFAULT_HOST.to_string(), vec![reg.clone()]);
        }
    }

    fn append_specific(&mut self, host: String, reg: &MiddlewareRegistration) {
        if !self.chains.contains_key(&host) {
            let seed = self.chains.get(DEFAULT_HOST).cloned().unwrap_or_default();
            self.insert(host.clone(), seed);
        }
        if let Some(chain) = self.chains.get_mut(&host) {
            chain.push(reg.clone());
        }
    }

    fn insert(&mut self, host: String, chain: Vec<MiddlewareRegistration>) {
        self.order.push(host.clone());
        self.chains.insert(host, chain);
    }

    /// Chain for `host`, outermost middleware first.
    pub fn get(&self, host: &str) -> Option<&[MiddlewareRegistration]> {
        self.chains.get(host).map(Vec::as_slice)
    }

    /// Host keys in the order they were first created.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Fold every chain around `terminal`, last middleware innermost.
    pub fn compose(&self, terminal: &Handler) -> RouterTable {
        let mut handlers = HashMap::with_capacity(self.chains.len());
        for host in &self.order {
            let chain = &self.chains[host];
            let handler = chain
                .iter()
                .rev()
                .fold(terminal.clone(), |next, reg| reg.middleware().wrap(next));
            handlers.insert(host.clone(), handler);
        }
        RouterTable::new(handlers, terminal.clone())
    }

    /// Log the resolved layout at debug level.
    pub fn log_layout(&self) {
        for host in &self.order {
            let labels: Vec<String> = self.chains[host]
                .iter()
                .map(MiddlewareRegistration::label)
                .collect();
            let host = if host.is_empty() { "<default>" } else { host.as_str() };
            tracing::debug!(host = %host, chain = ?labels, "Resolved host chain");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::Middleware;
    use crate::routing::registration::register;

    fn mw() -> Middleware {
        Middleware::new(|next: Handler| next)
    }

    fn priorities(chains: &HostChains, host: &str) -> Vec<i32> {
        chains
            .get(host)
            .expect("chain exists")
            .iter()
            .map(MiddlewareRegistration::priority)
            .collect()
    }

    #[test]
    fn wildcards_sorted_ascending_regardless_of_registration_order() {
        let regs = vec![
            register(10, Vec::<String>::new(), mw()),
            register(5, ["*"], mw()),
            register(1, Vec::<String>::new(), mw()),
        ];
        let chains = HostChains::resolve(&regs);
        assert_eq!(priorities(&chains, DEFAULT_HOST), vec![1, 5, 10]);
        assert_eq!(chains.len(), 1);
    }

    #[test]
    fn specific_host_inherits_prior_wildcards() {
        let regs = vec![
            register(1, ["*"], mw()),
            register(2, ["a.com"], mw()),
        ];
        let chains = HostChains::resolve(&regs);
        assert_eq!(priorities(&chains, "a.com"), vec![1, 2]);
        assert_eq!(priorities(&chains, DEFAULT_HOST), vec![1]);
    }

    #[test]
    fn later_wildcard_extends_existing_host_chains() {
        let regs = vec![
            register(1, ["a.com"], mw()),
            register(2, ["*"], mw()),
            register(3, ["b.com"], mw()),
        ];
        let chains = HostChains::resolve(&regs);
        // a.com existed before any wildcard, so it has no seed.
        assert_eq!(priorities(&chains, "a.com"), vec![1, 2]);
        assert_eq!(priorities(&chains, "b.com"), vec![2, 3]);
        assert_eq!(priorities(&chains, DEFAULT_HOST), vec![2]);
    }

    #[test]
    fn specific_only_host_has_own_chain() {
        let regs = vec![register(4, ["only.com"], mw())];
        let chains = HostChains::resolve(&regs);
        assert_eq!(priorities(&chains, "only.com"), vec![4]);
        assert!(chains.get(DEFAULT_HOST).is_none());
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let regs = vec![
            register(1, ["*"], mw()).named("first"),
            register(1, ["*"], mw()).named("second"),
        ];
        let chains = HostChains::resolve(&regs);
        let names: Vec<_> = chains
            .get(DEFAULT_HOST)
            .unwrap()
            .iter()
            .map(|r| r.name().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn mixed_case_hosts_share_one_chain() {
        let regs = vec![
            register(1, ["API.example.com"], mw()),
            register(2, ["api.EXAMPLE.com"], mw()),
        ];
        let chains = HostChains::resolve(&regs);
        assert_eq!(priorities(&chains, "api.example.com"), vec![1, 2]);
    }

    #[test]
    fn host_order_follows_first_appearance() {
        let regs = vec![
            register(3, ["c.com"], mw()),
            register(1, ["a.com"], mw()),
            register(2, ["*"], mw()),
        ];
        let chains = HostChains::resolve(&regs);
        let hosts: Vec<_> = chains.hosts().collect();
        assert_eq!(hosts, vec!["a.com", DEFAULT_HOST, "c.com"]);
    }

    #[test]
    fn no_registrations_resolve_to_nothing() {
        assert!(HostChains::resolve(&[]).is_empty());
    }
}
