//! Response helpers.
//!
//! # Responsibilities
//! - Terminal not-found responder at the end of every chain
//! - Keep the request scope open until the response body is finished

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use http_body::{Frame, SizeHint};
use pin_project_lite::pin_project;
use tokio_util::sync::DropGuard;

use crate::routing::Handler;

/// Plain `404 Not Found` response.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

/// Handler that always answers with [`not_found`].
pub fn not_found_handler() -> Handler {
    Handler::new(|_req| async { not_found() })
}

pin_project! {
    /// A body that holds a [`DropGuard`] until it reaches its end or is dropped.
    pub struct ScopedBody<B> {
        #[pin]
        inner: B,
        guard: Option<DropGuard>,
    }
}

impl<B> ScopedBody<B> {
    pub fn new(inner: B, guard: DropGuard) -> Self {
        Self {
            inner,
            guard: Some(guard),
        }
    }
}

impl<B: http_body::Body> http_body::Body for ScopedBody<B> {
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let polled = this.inner.poll_frame(cx);
        if let Poll::Ready(None) = polled {
            this.guard.take();
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Move `guard` into the body of `res`.
pub fn guard_body(res: Response, guard: DropGuard) -> Response {
    let (parts, body) = res.into_parts();
    Response::from_parts(parts, Body::new(ScopedBody::new(body, guard)))
}
