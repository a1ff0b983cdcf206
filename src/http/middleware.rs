//! Ready-made middleware.

use std::time::Instant;

use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::http::request::RequestId;
use crate::lifecycle::shutdown::RequestScope;
use crate::routing::host::host_key;
use crate::routing::{Handler, Middleware};

/// Log one line per request with status and latency.
pub fn access_log() -> Middleware {
    Middleware::from_fn(|req, next: Handler| async move {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let host = host_key(&req);
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| "-".to_string());

        let res = next.call(req).await;

        tracing::info!(
            request_id = %request_id,
            host = %host,
            method = %method,
            path = %path,
            status = res.status().as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Request served"
        );
        res
    })
}

/// Terminal middleware answering every request with `status` and `body`.
///
/// Anything registered after it on the same chain is never reached.
pub fn respond(status: StatusCode, body: &'static str) -> Middleware {
    Middleware::new(move |_next| Handler::new(move |_req| async move { (status, body) }))
}

/// Abort with `503` if the request scope is cancelled before `next` finishes.
///
/// Lets handlers that never check their [`RequestScope`] still stop promptly
/// when in-flight requests are force-cancelled during shutdown.
pub fn abort_on_shutdown() -> Middleware {
    Middleware::from_fn(|req, next: Handler| async move {
        let Some(scope) = req.extensions().get::<RequestScope>().cloned() else {
            return next.call(req).await;
        };

        tokio::select! {
            res = next.call(req) => res,
            _ = scope.cancelled() => {
                tracing::debug!("Request aborted by shutdown");
                (StatusCode::SERVICE_UNAVAILABLE, "Server shutting down").into_response()
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::shutdown::ShutdownToken;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;

    fn slow() -> Handler {
        Handler::new(|_req| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "done"
        })
    }

    #[tokio::test]
    async fn respond_ignores_next() {
        let res = respond(StatusCode::IM_A_TEAPOT, "tea")
            .wrap(slow())
            .call(Request::new(Body::empty()))
            .await;
        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn access_log_passes_response_through() {
        let res = access_log()
            .wrap(respond(StatusCode::ACCEPTED, "ok").wrap(slow()))
            .call(Request::new(Body::empty()))
            .await;
        assert_eq!(res.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn abort_on_shutdown_stops_slow_handler() {
        let token = ShutdownToken::new();
        let (scope, _guard) = token.request_scope();
        let mut req = Request::new(Body::empty());
        req.extensions_mut().insert(scope);

        let handler = abort_on_shutdown().wrap(slow());
        let pending = tokio::spawn(async move { handler.call(req).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        token.force_cancel();

        let res = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .expect("handler should abort")
            .unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
