//! Host key extraction for dispatch.
//!
//! # Responsibilities
//! - Pick the host value a request is addressed to
//! - Reduce it to a bare hostname (no port, no IPv6 brackets)
//!
//! # Design Decisions
//! - Forwarded host wins so the server works behind a proxy
//! - Unparsable values are used verbatim rather than rejected

use std::str::FromStr;

use axum::http::uri::Authority;
use axum::http::{header, HeaderMap, Request};

/// Header set by reverse proxies to carry the original host.
pub const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Alternate host header.
pub const X_HOST: &str = "x-host";

/// Raw host value of `req`, or `default` when none is present.
///
/// Precedence: `X-Forwarded-Host`, `Host`, `X-Host`, then the request URI
/// authority.
pub fn raw_host<'a, B>(req: &'a Request<B>, default: &'a str) -> &'a str {
    let headers = req.headers();
    header_value(headers, X_FORWARDED_HOST)
        .or_else(|| header_value(headers, header::HOST.as_str()))
        .or_else(|| header_value(headers, X_HOST))
        .or_else(|| req.uri().host().filter(|h| !h.is_empty()))
        .unwrap_or(default)
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Strip the port and IPv6 brackets from a host value.
pub fn hostname(raw: &str) -> &str {
    let host = match Authority::from_str(raw) {
        Ok(_) => strip_port(raw),
        Err(_) => return raw,
    };
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

fn strip_port(authority: &str) -> &str {
    // Drop userinfo the same way `Authority::host` does.
    let authority = authority.rsplit('@').next().unwrap_or(authority);
    if authority.starts_with('[') {
        return match authority.find(']') {
            Some(end) => &authority[..=end],
            None => authority,
        };
    }
    match authority.rfind(':') {
        Some(colon) => &authority[..colon],
        None => authority,
    }
}

/// Lookup key for `req`: bare hostname, lower-cased.
pub fn host_key<B>(req: &Request<B>) -> String {
    hostname(raw_host(req, "")).to_ascii_lowercase()
}
