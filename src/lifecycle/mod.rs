//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (server.rs):
//!     Validate → Build router table → Resolve address → TLS (configured,
//!     or self-signed on 443/8443) → Spawn listener → Watch startup window
//!
//! Stop (server.rs, shutdown.rs):
//!     Stop accepting → Drain connections → Force-cancel requests past the
//!     request budget → Close leftovers at the shutdown deadline → Release
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → caller invokes stop
//! ```

pub mod error;
pub mod server;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use error::ServerError;
pub use server::{start, stop, Server};
pub use shutdown::{DeadlineScope, RequestScope, ShutdownToken};
pub use state::LifecycleState;
