//! Host-routed HTTP(S) server library.
//!
//! Middleware is registered per host with a priority, compiled once into a
//! [`RouterTable`](routing::RouterTable) of composed handler chains, and served
//! by a [`Server`](lifecycle::Server) that manages binding, self-signed TLS
//! fallback and a two-stage graceful drain.
//!
//! ```text
//!  registrations ──▶ routing (sort, per-host chains, fold)
//!                         │
//!  request ──▶ net/http ──┴──▶ dispatch (host key) ──▶ chain ──▶ response
//!                                   │
//!                      lifecycle (shutdown token, request scopes)
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::{Options, ServerBuilder, ServerConfig};
pub use lifecycle::{LifecycleState, RequestScope, Server, ServerError};
pub use routing::{register, Handler, Middleware, MiddlewareRegistration};
