//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (axum-server)
//!     → server.rs (Axum app, timeouts, trace layer)
//!     → dispatch.rs (host key, RouterTable lookup, request scope)
//!     → composed host chain (middleware.rs, request.rs building blocks)
//!     → response.rs (not-found terminal)
//! ```

pub mod dispatch;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::Dispatcher;
pub use request::{RequestId, X_REQUEST_ID};
