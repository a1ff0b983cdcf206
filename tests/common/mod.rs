//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hostgate::config::options::addr;
use hostgate::lifecycle::{self, RequestScope, Server};
use hostgate::routing::{Handler, Middleware};
use hostgate::{ServerBuilder, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Builder bound to an ephemeral local port with a short startup window.
pub fn builder() -> ServerBuilder {
    let mut config = ServerConfig::default();
    config.listener.startup_window_ms = 50;
    ServerBuilder::new(config).option(addr("127.0.0.1:0"))
}

/// Start the server and return it with its bound address.
pub async fn start(builder: ServerBuilder) -> (Server, SocketAddr) {
    let options = builder.build().expect("options should build");
    let server = lifecycle::start(options).await.expect("server should start");
    let local = server.local_addr().expect("running server has an address");
    (server, local)
}

/// Send `GET /` with a literal `Host` header over a fresh connection and
/// return the status code and body.
pub async fn raw_get(addr: SocketAddr, host: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET / HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", host);
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw).into_owned();

    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

/// Terminal middleware that sleeps for `delay` and ignores cancellation.
pub fn sleeper(delay: Duration) -> Middleware {
    Middleware::new(move |_next| {
        Handler::new(move |_req: Request<Body>| async move {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, "slept")
        })
    })
}

/// Terminal middleware that answers `503` once its request scope is cancelled.
pub fn until_cancelled() -> Middleware {
    Middleware::new(|_next| {
        Handler::new(|req: Request<Body>| async move {
            let scope = req.extensions().get::<RequestScope>().cloned();
            match scope {
                Some(scope) => scope.cancelled().await,
                None => std::future::pending::<()>().await,
            }
            (StatusCode::SERVICE_UNAVAILABLE, "cancelled")
        })
    })
}

/// Terminal middleware that keeps working for `cleanup` after its request
/// scope is cancelled, then answers `503`.
pub fn slow_after_cancel(cleanup: Duration) -> Middleware {
    Middleware::new(move |_next| {
        Handler::new(move |req: Request<Body>| async move {
            let scope = req.extensions().get::<RequestScope>().cloned();
            if let Some(scope) = scope {
                scope.cancelled().await;
            }
            tokio::time::sleep(cleanup).await;
            (StatusCode::SERVICE_UNAVAILABLE, "cleaned up")
        })
    })
}
