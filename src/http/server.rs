//! HTTP application and protocol setup.
//!
//! # Responsibilities
//! - Create the Axum app routing every request to the dispatcher
//! - Wire up tower-http layers for read/write timeouts and tracing
//! - Tune the hyper connection builder (header timeout, buffer size, keep-alive)

use std::time::Duration;

use axum::routing::Router;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use tower_http::{
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::dispatch::{dispatch, Dispatcher};

/// Smallest read buffer hyper accepts for HTTP/1.
pub const MIN_HEADER_BUFFER: usize = 8192;

/// Build the Axum app with all middleware layers.
#[allow(deprecated)]
pub fn build_app(dispatcher: Dispatcher, config: &ServerConfig) -> Router {
    let mut app = Router::new().fallback(dispatch).with_state(dispatcher);

    if let Some(write) = config.timeouts.write() {
        app = app.layer(TimeoutLayer::new(write));
    }
    if let Some(read) = config.timeouts.read() {
        app = app.layer(RequestBodyTimeoutLayer::new(read));
    }

    app.layer(TraceLayer::new_for_http())
}

/// Apply connection-level limits to the hyper builder.
///
/// The idle timeout only drives HTTP/2 keep-alive pings; hyper has no idle
/// limit for HTTP/1 keep-alive connections.
pub fn configure_protocol(builder: &mut Builder<TokioExecutor>, config: &ServerConfig) {
    let header_buffer = config.listener.max_header_bytes.max(MIN_HEADER_BUFFER);
    let header_timeout = config.timeouts.read_header();
    let keep_alive = http2_keep_alive(config);

    {
        let mut http1 = builder.http1();
        http1.timer(TokioTimer::new());
        http1.max_buf_size(header_buffer);
        if let Some(timeout) = header_timeout {
            http1.header_read_timeout(timeout);
        }
    }

    if let Some((interval, timeout)) = keep_alive {
        let mut http2 = builder.http2();
        http2.timer(TokioTimer::new());
        http2.keep_alive_interval(interval);
        http2.keep_alive_timeout(timeout);
    }

    tracing::debug!(
        header_buffer,
        header_timeout = ?header_timeout,
        http2_keep_alive = ?keep_alive,
        "HTTP protocol configured"
    );
}

/// HTTP/2 ping interval and ping timeout derived from the idle timeout.
fn http2_keep_alive(config: &ServerConfig) -> Option<(Duration, Duration)> {
    config
        .timeouts
        .idle()
        .map(|interval| (interval, interval.min(Duration::from_secs(20))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::middleware::respond;
    use crate::lifecycle::shutdown::ShutdownToken;
    use crate::routing::{register, RouterTable};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(config: &ServerConfig) -> Router {
        let table = RouterTable::build(&[register(
            1,
            ["a.com"],
            respond(StatusCode::OK, "a"),
        )]);
        build_app(Dispatcher::new(Arc::new(table), ShutdownToken::new()), config)
    }

    #[tokio::test]
    async fn app_dispatches_any_path_and_method() {
        let req = Request::builder()
            .method("DELETE")
            .uri("/deep/nested/path?x=1")
            .header("host", "a.com")
            .body(Body::empty())
            .unwrap();
        let res = app(&ServerConfig::default()).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn app_without_timeouts_still_serves() {
        let mut config = ServerConfig::default();
        config.timeouts.read_ms = 0;
        config.timeouts.write_ms = 0;
        let req = Request::builder()
            .header("host", "b.com")
            .body(Body::empty())
            .unwrap();
        let res = app(&config).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn protocol_builder_accepts_small_header_limit() {
        let mut builder = Builder::new(TokioExecutor::new());
        configure_protocol(&mut builder, &ServerConfig::default());
    }

    #[test]
    fn idle_timeout_drives_http2_keep_alive() {
        let mut config = ServerConfig::default();
        assert_eq!(
            http2_keep_alive(&config),
            Some((Duration::from_secs(1800), Duration::from_secs(20)))
        );

        config.timeouts.idle_ms = 1500;
        assert_eq!(
            http2_keep_alive(&config),
            Some((Duration::from_millis(1500), Duration::from_millis(1500)))
        );

        config.timeouts.idle_ms = 0;
        assert_eq!(http2_keep_alive(&config), None);
    }
}
