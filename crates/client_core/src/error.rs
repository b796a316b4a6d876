use thiserror::Error;

use crate::session::SessionState;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to connect to game server at {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },
    #[error("game server connection closed: {reason}")]
    TransportClosed { reason: String },
    #[error("session is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },
}

impl SessionError {
    pub fn is_transport_closed(&self) -> bool {
        matches!(self, Self::TransportClosed { .. })
    }
}

/// Failures that end a control loop run.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("perception source failed: {0}")]
    PerceptionSource(String),
}
