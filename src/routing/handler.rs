//! Handler and middleware types.
//!
//! A [`Handler`] is a cloneable async function from request to response. A
//! [`Middleware`] wraps the next handler in the chain and returns a new one,
//! the same shape as a `tower::Layer` restricted to [`Handler`].

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service, ServiceExt};

/// Boxed response future returned by every [`Handler`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A terminal or composed request handler.
///
/// Cheap to clone; all clones share the same underlying function.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<dyn Fn(Request<Body>) -> HandlerFuture + Send + Sync>,
}

impl Handler {
    /// Create a handler from an async function.
    pub fn new<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self {
            inner: Arc::new(move |req: Request<Body>| -> HandlerFuture {
                let fut = f(req);
                Box::pin(async move { fut.await.into_response() })
            }),
        }
    }

    /// Adapt an infallible `tower::Service` into a handler.
    pub fn from_service<S>(service: S) -> Self
    where
        S: Service<Request<Body>, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Response: IntoResponse,
        S::Future: Send + 'static,
    {
        Self::new(move |req| {
            let service = service.clone();
            async move {
                match service.oneshot(req).await {
                    Ok(response) => response.into_response(),
                    Err(never) => match never {},
                }
            }
        })
    }

    /// Invoke the handler.
    pub fn call(&self, req: Request<Body>) -> HandlerFuture {
        (self.inner)(req)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

impl Service<Request<Body>> for Handler {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let fut = Handler::call(self, req);
        Box::pin(async move { Ok(fut.await) })
    }
}

/// A request-processing layer: receives the next handler, returns the wrapped one.
#[derive(Clone)]
pub struct Middleware {
    wrap: Arc<dyn Fn(Handler) -> Handler + Send + Sync>,
}

impl Middleware {
    /// Create a middleware from a wrapping function.
    pub fn new<F>(wrap: F) -> Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        Self { wrap: Arc::new(wrap) }
    }

    /// Create a middleware from a per-request function that may call `next`.
    ///
    /// ```rust,ignore
    /// let mw = Middleware::from_fn(|req, next| async move {
    ///     let mut res = next.call(req).await;
    ///     res.headers_mut().insert("x-served-by", HeaderValue::from_static("hostgate"));
    ///     res
    /// });
    /// ```
    pub fn from_fn<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request<Body>, Handler) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self::new(move |next| {
            let f = f.clone();
            Handler::new(move |req| f(req, next.clone()))
        })
    }

    /// Adapt a `tower::Layer` whose service stays infallible.
    pub fn layer<L>(layer: L) -> Self
    where
        L: Layer<Handler> + Send + Sync + 'static,
        L::Service: Service<Request<Body>, Error = Infallible> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request<Body>>>::Response: IntoResponse,
        <L::Service as Service<Request<Body>>>::Future: Send + 'static,
    {
        Self::new(move |next| Handler::from_service(layer.layer(next)))
    }

    /// Wrap `next` with this middleware.
    pub fn wrap(&self, next: Handler) -> Handler {
        (self.wrap)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware").finish_non_exhaustive()
    }
}
