//! Per-request dispatch into the router table.
//!
//! # Responsibilities
//! - Extract the host key from the request
//! - Resolve the composed handler (host → default → not-found)
//! - Run the handler inside a [`RequestScope`] tied to server shutdown
//!
//! # Design Decisions
//! - The scope is a child of the shutdown token; its drop guard moves into the
//!   response body, so it ends once the body is sent or the connection drops it
//! - Host keys are lower-cased at lookup as well as at build time

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::Response;

use crate::http::response::guard_body;
use crate::lifecycle::shutdown::{RequestScope, ShutdownToken};
use crate::routing::host::host_key;
use crate::routing::RouterTable;

/// Resolves requests against a [`RouterTable`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<RouterTable>,
    shutdown: ShutdownToken,
}

impl Dispatcher {
    pub fn new(table: Arc<RouterTable>, shutdown: ShutdownToken) -> Self {
        Self { table, shutdown }
    }

    pub fn table(&self) -> &RouterTable {
        &self.table
    }

    /// Serve one request.
    pub async fn dispatch(&self, mut req: Request<Body>) -> Response {
        let key = host_key(&req);
        let (handler, matched) = self.table.resolve(&key);

        let label = match matched {
            Some("") => "default".to_string(),
            Some(host) => host.to_string(),
            None => "not_found".to_string(),
        };
        metrics::counter!("hostgate_requests_total", "host" => label.clone()).increment(1);
        tracing::trace!(host = %key, chain = %label, "Dispatching request");

        let (scope, guard) = self.shutdown.request_scope();
        req.extensions_mut().insert::<RequestScope>(scope);

        let res = handler.call(req).await;
        guard_body(res, guard)
    }
}

/// Axum fallback handler wrapping [`Dispatcher::dispatch`].
pub async fn dispatch(State(dispatcher): State<Dispatcher>, req: Request<Body>) -> Response {
    dispatcher.dispatch(req).await
}
