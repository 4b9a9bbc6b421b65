//! Domain error types

use crate::session::game_session::SessionPhase;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid difficulty: {0}")]
    InvalidDifficulty(String),

    #[error("Invalid operation cost for {kind}: costs must be positive")]
    InvalidCost { kind: String },

    #[error("Session {session_id} is {actual}, expected {expected}")]
    InvalidSessionState {
        session_id: String,
        expected: SessionPhase,
        actual: SessionPhase,
    },

    #[error("Message content is empty")]
    EmptyMessage,

    #[error("Unsupported session snapshot version: {0}")]
    UnsupportedSnapshotVersion(u32),
}

impl DomainError {
    /// Check if this error is a session state (contract) violation
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, DomainError::InvalidSessionState { .. })
    }
}
