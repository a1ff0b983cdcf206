//! Server lifecycle controller.
//!
//! # Responsibilities
//! - Build the router table and the shutdown token from [`Options`]
//! - Bind the listener (plain, configured TLS or self-signed TLS) and watch it
//!   through the startup window
//! - Drain connections on stop, force-cancelling requests that outlive the
//!   request budget
//!
//! # Design Decisions
//! - The router table is immutable once built; registrations after `new` are
//!   not possible
//! - Drain completion is always awaited before `stop` returns, even when the
//!   caller's context is cancelled
//! - State transitions are published on a watch channel

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, Options, ServerConfig};
use crate::http::server::{build_app, configure_protocol};
use crate::http::Dispatcher;
use crate::lifecycle::error::ServerError;
use crate::lifecycle::shutdown::{DeadlineScope, ShutdownToken};
use crate::lifecycle::state::LifecycleState;
use crate::net::listener::{effective_address, is_secure_port, resolve};
use crate::net::tls::{build_transport_config, issue_self_signed, load_tls_config};
use crate::net::CertificateRequest;
use crate::routing::RouterTable;

type ListenerTask = JoinHandle<io::Result<()>>;

/// An HTTP(S) server dispatching by host.
#[derive(Debug)]
pub struct Server {
    options: Options,
    table: Arc<RouterTable>,
    shutdown: ShutdownToken,
    handle: Handle,
    listener: Option<ListenerTask>,
    local_addr: Option<SocketAddr>,
    state: watch::Sender<LifecycleState>,
}

impl Server {
    /// Validate `options` and compile the router table.
    pub fn new(options: Options) -> Result<Self, ServerError> {
        validate_config(&options.config).map_err(ConfigError::Validation)?;

        let table = Arc::new(RouterTable::build(&options.registrations));
        let (state, _) = watch::channel(LifecycleState::Created);

        Ok(Self {
            options,
            table,
            shutdown: ShutdownToken::new(),
            handle: Handle::new(),
            listener: None,
            local_addr: None,
            state,
        })
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Receive every subsequent state transition.
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Address the listener is bound to, once running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn shutdown_token(&self) -> &ShutdownToken {
        &self.shutdown
    }

    pub fn table(&self) -> &RouterTable {
        &self.table
    }

    pub fn config(&self) -> &ServerConfig {
        &self.options.config
    }

    /// Bind and start serving.
    ///
    /// Returns once the listener has survived the startup window, or as soon
    /// as it fails inside it.
    pub async fn start(&mut self) -> Result<(), ServerError> {
        let current = self.state();
        if current != LifecycleState::Created {
            return Err(ServerError::InvalidState {
                expected: LifecycleState::Created,
                actual: current,
            });
        }
        self.set_state(LifecycleState::Starting);

        match self.launch().await {
            Ok(state) => {
                self.set_state(state);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Server failed to start");
                self.set_state(LifecycleState::FailedToStart);
                Err(e)
            }
        }
    }

    async fn launch(&mut self) -> Result<LifecycleState, ServerError> {
        let config = self.options.config.clone();

        let mut tls = match (&self.options.tls, &config.listener.tls) {
            (Some(tls), _) => Some(tls.clone()),
            (None, Some(files)) => Some(
                load_tls_config(Path::new(&files.cert_path), Path::new(&files.key_path)).await?,
            ),
            (None, None) => None,
        };

        let address = effective_address(&config.listener.address, tls.is_some());
        let addr = resolve(&address)
            .await
            .map_err(|e| ServerError::bind(&address, e))?;

        if tls.is_none() && is_secure_port(&addr) {
            tracing::info!(
                address = %addr,
                "No TLS material configured for a secure port, issuing self-signed certificate"
            );
            let request = CertificateRequest::localhost(config.listener.self_signed_validity());
            let certificate = issue_self_signed(&request, None)?;
            tls = Some(build_transport_config(&[certificate]).await?);
        }

        let dispatcher = Dispatcher::new(Arc::clone(&self.table), self.shutdown.clone());
        let app = build_app(dispatcher, &config);
        let secure = tls.is_some();
        let mut task = spawn_listener(addr, tls, app, self.handle.clone(), &config);

        let window = config.listener.startup_window();
        tokio::select! {
            joined = &mut task => {
                return match joined {
                    Ok(Ok(())) => {
                        tracing::info!(address = %addr, "Listener exited during startup window");
                        Ok(LifecycleState::Stopped)
                    }
                    Ok(Err(e)) => Err(ServerError::bind(addr, e)),
                    Err(e) => Err(ServerError::Join(e)),
                };
            }
            _ = tokio::time::sleep(window) => {}
        }

        self.local_addr = self.handle.listening().await;
        self.listener = Some(task);

        tracing::info!(
            address = %self.local_addr.unwrap_or(addr),
            tls = secure,
            hosts = self.table.len(),
            "Server running"
        );
        Ok(LifecycleState::Running)
    }

    /// Drain and stop the server.
    ///
    /// `ctx` bounds the whole operation together with the configured shutdown
    /// timeout; cancelling it aborts the drain early. Stopping a server that
    /// is not running does nothing.
    pub async fn stop(&mut self, ctx: CancellationToken) -> Result<(), ServerError> {
        let current = self.state();
        if current != LifecycleState::Running {
            tracing::info!(state = %current, "Stop requested while not running, ignoring");
            return Ok(());
        }
        let Some(listener) = self.listener.take() else {
            self.set_state(LifecycleState::Stopped);
            return Ok(());
        };
        self.set_state(LifecycleState::Draining);

        let shutdown = &self.options.config.shutdown;
        let drain_timeout = shutdown.timeout();
        let request_budget = shutdown.request_timeout();
        tracing::info!(
            timeout = ?drain_timeout,
            request_timeout = ?request_budget,
            "Draining connections"
        );

        let done = CancellationToken::new();
        let draining = tokio::spawn(drain(
            self.handle.clone(),
            listener,
            DeadlineScope::new(&ctx, drain_timeout),
            done.clone(),
        ));

        if let Some(budget) = request_budget {
            let window = DeadlineScope::new(&done, Some(budget));
            window.cancelled().await;
            if window.expired() && !done.is_cancelled() {
                self.shutdown.force_cancel();
            }
        }

        let result = draining.await.unwrap_or_else(|e| Err(ServerError::Join(e)));
        self.shutdown.release();
        self.set_state(LifecycleState::Stopped);

        match &result {
            Ok(()) => tracing::info!(forced = self.shutdown.was_forced(), "Server stopped"),
            Err(e) => tracing::warn!(error = %e, "Server stopped with errors"),
        }
        result
    }

    fn set_state(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        tracing::debug!(from = %previous, to = %next, "Lifecycle transition");
    }
}

/// Build a server from `options` and start it.
pub async fn start(options: Options) -> Result<Server, ServerError> {
    let mut server = Server::new(options)?;
    server.start().await?;
    Ok(server)
}

/// Stop `server`, bounded by `ctx`.
pub async fn stop(server: &mut Server, ctx: CancellationToken) -> Result<(), ServerError> {
    server.stop(ctx).await
}

fn spawn_listener(
    addr: SocketAddr,
    tls: Option<RustlsConfig>,
    app: Router,
    handle: Handle,
    config: &ServerConfig,
) -> ListenerTask {
    match tls {
        Some(tls) => {
            let mut server = axum_server::bind_rustls(addr, tls).handle(handle);
            configure_protocol(server.http_builder(), config);
            tokio::spawn(async move {
                let result = server.serve(app.into_make_service()).await;
                log_listener_exit(&result);
                result
            })
        }
        None => {
            let mut server = axum_server::bind(addr).handle(handle);
            configure_protocol(server.http_builder(), config);
            tokio::spawn(async move {
                let result = server.serve(app.into_make_service()).await;
                log_listener_exit(&result);
                result
            })
        }
    }
}

fn log_listener_exit(result: &io::Result<()>) {
    match result {
        Ok(()) => tracing::debug!("Listener exited"),
        Err(e) => tracing::error!(error = %e, "Listener failed"),
    }
}

/// Stop accepting, wait for open connections, and close whatever is left
/// once `deadline` fires. Cancels `done` when finished.
async fn drain(
    handle: Handle,
    mut listener: ListenerTask,
    deadline: DeadlineScope,
    done: CancellationToken,
) -> Result<(), ServerError> {
    let _done = done.drop_guard();
    handle.graceful_shutdown(None);

    tokio::select! {
        joined = &mut listener => listener_result(joined),
        _ = deadline.cancelled() => {
            tracing::warn!(
                connections = handle.connection_count(),
                "Closing connections before drain finished"
            );
            handle.shutdown();
            if let Err(e) = listener_result(listener.await) {
                tracing::debug!(error = %e, "Listener exited with error after forced close");
            }

            if deadline.expired() {
                Err(ServerError::DrainTimeout {
                    timeout: deadline.timeout().unwrap_or_default(),
                })
            } else {
                Err(ServerError::DrainInterrupted)
            }
        }
    }
}

fn listener_result(joined: Result<io::Result<()>, JoinError>) -> Result<(), ServerError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ServerError::Listener(e)),
        Err(e) => Err(ServerError::Join(e)),
    }
}
