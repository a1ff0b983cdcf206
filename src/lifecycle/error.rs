//! Lifecycle errors.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinError;

use crate::config::ConfigError;
use crate::lifecycle::state::LifecycleState;
use crate::net::CertificateError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("certificate error: {0}")]
    Certificate(#[from] CertificateError),

    #[error("connections still open after shutdown timeout of {timeout:?}")]
    DrainTimeout { timeout: Duration },

    #[error("shutdown interrupted before connections drained")]
    DrainInterrupted,

    #[error("server is {actual}, expected {expected}")]
    InvalidState {
        expected: LifecycleState,
        actual: LifecycleState,
    },

    #[error("listener failed: {0}")]
    Listener(#[source] io::Error),

    #[error("listener task failed: {0}")]
    Join(#[from] JoinError),
}

impl ServerError {
    pub(crate) fn bind(addr: impl ToString, source: io::Error) -> Self {
        ServerError::Bind {
            addr: addr.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_names_both_states() {
        let err = ServerError::InvalidState {
            expected: LifecycleState::Created,
            actual: LifecycleState::Running,
        };
        assert_eq!(err.to_string(), "server is running, expected created");
    }

    #[test]
    fn bind_error_keeps_source() {
        let err = ServerError::bind(
            "127.0.0.1:80",
            io::Error::new(io::ErrorKind::AddrInUse, "in use"),
        );
        assert!(err.to_string().contains("127.0.0.1:80"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
