//! Server lifecycle states.

use std::fmt;

/// Where a [`Server`](crate::lifecycle::Server) is in its lifecycle.
///
/// ```text
/// Created → Starting → Running → Draining → Stopped
///              ├─────────────────────────→ Stopped (listener exited cleanly)
///              └→ FailedToStart
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Created,
    Starting,
    Running,
    Draining,
    Stopped,
    FailedToStart,
}

impl LifecycleState {
    /// No further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Stopped | LifecycleState::FailedToStart)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
            LifecycleState::FailedToStart => "failed_to_start",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
