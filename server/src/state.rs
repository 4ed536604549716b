//! Service lifecycle state.

use serde::Serialize;

/// Operational state of the quote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// Service is constructed but the scheduler is not running.
    Starting,
    /// Scheduler is running and reads are served.
    Running,
    /// Shutdown requested, the scheduler is finishing its current cycle.
    ShuttingDown,
    /// Scheduler has exited.
    Stopped,
}

impl ServiceState {
    /// Check if the service is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceState::Stopped)
    }
}
