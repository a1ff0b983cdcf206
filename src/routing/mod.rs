//! Host routing subsystem.
//!
//! # Data Flow
//! ```text
//! Router compilation (at startup):
//!     MiddlewareRegistration[]
//!     → chain.rs (sort by priority, resolve per-host chains)
//!     → router.rs (fold chains into handlers, freeze as RouterTable)
//!
//! Per request:
//!     host.rs (extract host key)
//!     → RouterTable::resolve (exact host → default → not-found)
//! ```
//!
//! # Design Decisions
//! - Table compiled at startup, immutable at runtime
//! - Host matching only, no path routing
//! - Deterministic: same registrations always give the same chains
//! - Lowest priority number is the outermost middleware

pub mod chain;
pub mod handler;
pub mod host;
pub mod registration;
pub mod router;

pub use chain::{HostChains, DEFAULT_HOST};
pub use handler::{Handler, HandlerFuture, Middleware};
pub use registration::{register, MiddlewareRegistration, WILDCARD_HOST};
pub use router::RouterTable;
