//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig
//!     → listener.rs (effective address, resolution, secure port check)
//!     → tls.rs (configured PEM files, or self-signed fallback on 443/8443)
//!     → handed to the lifecycle controller to bind
//! ```
//!
//! # Design Decisions
//! - TLS is optional and handled transparently by axum-server
//! - Self-signed certificates are a local convenience, never a production default

pub mod listener;
pub mod tls;

pub use tls::{CertificateError, CertificateRequest, IssuedCertificate, KeyAlgorithm};
