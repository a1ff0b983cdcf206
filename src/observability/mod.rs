//! Observability subsystem.
//!
//! ```text
//! All subsystems produce:
//!     → logging.rs (tracing events, pretty/JSON/compact)
//!     → metrics.rs (counters, Prometheus scrape endpoint)
//! ```

pub mod logging;
pub mod metrics;
