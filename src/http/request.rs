//! Request identification.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) unless the client sent one
//! - Make it available to inner handlers and echo it on the response
//!
//! # Design Decisions
//! - Register it at a low priority number so it is outermost and every other
//!   middleware sees the ID

use axum::http::HeaderValue;
use uuid::Uuid;

use crate::routing::{Handler, Middleware};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID stored in the request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Middleware assigning a request ID.
pub fn request_id() -> Middleware {
    Middleware::from_fn(|mut req, next: Handler| async move {
        let id = req
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let header = HeaderValue::from_str(&id).ok();
        if let Some(value) = &header {
            req.headers_mut().insert(X_REQUEST_ID, value.clone());
        }
        req.extensions_mut().insert(RequestId(id));

        let mut res = next.call(req).await;
        if let Some(value) = header {
            res.headers_mut().insert(X_REQUEST_ID, value);
        }
        res
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    fn echo_id() -> Handler {
        Handler::new(|req: Request<Body>| async move {
            let id = req
                .extensions()
                .get::<RequestId>()
                .map(|id| id.0.clone())
                .unwrap_or_default();
            (StatusCode::OK, id)
        })
    }

    #[tokio::test]
    async fn generates_id_when_missing() {
        let res = request_id().wrap(echo_id()).call(Request::new(Body::empty())).await;
        let header = res.headers().get(X_REQUEST_ID).unwrap().to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&header).is_ok());

        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(body, header.as_bytes());
    }

    #[tokio::test]
    async fn keeps_client_id() {
        let req = Request::builder()
            .header(X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        let res = request_id().wrap(echo_id()).call(req).await;
        assert_eq!(res.headers().get(X_REQUEST_ID).unwrap(), "abc-123");
    }
}
