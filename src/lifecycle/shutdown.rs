//! Shutdown coordination: the shared shutdown token, per-request scopes and
//! deadline-bound cancellation scopes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFuture};

/// Process-wide signal used to abort in-flight requests during a slow drain.
///
/// Fired either by [`force_cancel`](Self::force_cancel) when the request drain
/// budget runs out, or by [`release`](Self::release) at the end of shutdown.
/// Both are idempotent.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    token: CancellationToken,
    forced: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every open request scope. Returns `true` on the first call only.
    pub fn force_cancel(&self) -> bool {
        let first = !self.forced.swap(true, Ordering::SeqCst);
        if first {
            metrics::counter!("hostgate_forced_cancellations_total").increment(1);
            tracing::warn!("Forcing cancellation of in-flight requests");
        }
        self.token.cancel();
        first
    }

    /// Release the token once shutdown has finished.
    pub fn release(&self) {
        self.token.cancel();
    }

    /// Whether [`force_cancel`](Self::force_cancel) has been called.
    pub fn was_forced(&self) -> bool {
        self.forced.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Open a scope for one request.
    pub fn request_scope(&self) -> (RequestScope, DropGuard) {
        let token = self.token.child_token();
        let guard = token.clone().drop_guard();
        (RequestScope { token }, guard)
    }
}

/// Cancellation context of a single request.
///
/// Inserted into the request extensions by the dispatcher. Cancelled when the
/// request finishes or when the server forces in-flight requests to stop;
/// long-running handlers should race their work against
/// [`cancelled`](Self::cancelled).
#[derive(Debug, Clone)]
pub struct RequestScope {
    token: CancellationToken,
}

impl RequestScope {
    /// Completes once the scope is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// A scope cancelled after `timeout` or when its parent is cancelled,
/// whichever comes first. Without a timeout it simply follows the parent.
///
/// Dropping the scope cancels it and stops the timer.
#[derive(Debug)]
pub struct DeadlineScope {
    token: CancellationToken,
    expired: Arc<AtomicBool>,
    timeout: Option<Duration>,
    timer: Option<JoinHandle<()>>,
}

impl DeadlineScope {
    pub fn new(parent: &CancellationToken, timeout: Option<Duration>) -> Self {
        let token = parent.child_token();
        let expired = Arc::new(AtomicBool::new(false));

        let timer = timeout.map(|timeout| {
            let token = token.clone();
            let expired = Arc::clone(&expired);
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(timeout) => {
                        expired.store(true, Ordering::SeqCst);
                        token.cancel();
                    }
                    _ = token.cancelled() => {}
                }
            })
        });

        Self {
            token,
            expired,
            timeout,
            timer,
        }
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `true` if the timeout fired, as opposed to the parent cancelling.
    pub fn expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for DeadlineScope {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
