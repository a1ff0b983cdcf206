//! Bind address resolution.
//!
//! # Responsibilities
//! - Pick the effective bind address (configured or protocol default)
//! - Expand `:port` shorthand to all interfaces
//! - Resolve host names to a socket address
//! - Recognise well-known secure ports

use std::io;
use std::net::SocketAddr;

/// Default plain HTTP bind address.
pub const DEFAULT_PLAIN_ADDRESS: &str = "0.0.0.0:8080";

/// Default HTTPS bind address.
pub const DEFAULT_TLS_ADDRESS: &str = "0.0.0.0:8443";

/// Ports that get a self-signed certificate when no TLS material is configured.
pub const SECURE_PORTS: [u16; 2] = [443, 8443];

/// Effective bind address for `configured`, given whether TLS is configured.
pub fn effective_address(configured: &str, tls: bool) -> String {
    let configured = configured.trim();
    if configured.is_empty() {
        let default = if tls {
            DEFAULT_TLS_ADDRESS
        } else {
            DEFAULT_PLAIN_ADDRESS
        };
        return default.to_string();
    }
    match configured.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => configured.to_string(),
    }
}

/// Resolve `address` to the first matching socket address.
pub async fn resolve(address: &str) -> io::Result<SocketAddr> {
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(addr);
    }
    tokio::net::lookup_host(address).await?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no addresses found for {}", address),
        )
    })
}

pub fn is_secure_port(addr: &SocketAddr) -> bool {
    SECURE_PORTS.contains(&addr.port())
}
