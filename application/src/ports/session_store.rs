//! Persistence collaborator port

use async_trait::async_trait;
use gameplan_domain::{GameSessionSnapshot, SessionId};
use thiserror::Error;

/// Errors raised by a session store backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(
        &self,
        session_id: &SessionId,
        snapshot: &GameSessionSnapshot,
    ) -> Result<(), SessionStoreError>;

    async fn get(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<GameSessionSnapshot>, SessionStoreError>;
}
