//! Error taxonomy surfaced by the session use cases.

use super::credit_ledger::LedgerError;
use crate::ports::session_store::SessionStoreError;
use gameplan_domain::{DomainError, ProviderId, SessionId, TopicId, UserId};
use thiserror::Error;

/// Errors from game operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("No user is signed in")]
    Unauthenticated,

    #[error("No credit account for user {0}")]
    AccountNotFound(UserId),

    #[error("Insufficient credits: balance {balance}, required {required}")]
    InsufficientCredits { balance: u64, required: u64 },

    #[error("Invalid session state: {0}")]
    InvalidSessionState(DomainError),

    #[error("Unknown topic: {0}")]
    UnknownTopic(TopicId),

    #[error("Unknown provider: {0}")]
    UnknownProvider(ProviderId),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl GameError {
    /// Whether the error is something the player can act on, as opposed to
    /// a diagnostic that belongs in the logs.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            GameError::Unauthenticated
                | GameError::InsufficientCredits { .. }
                | GameError::UnknownTopic(_)
                | GameError::UnknownProvider(_)
                | GameError::SessionNotFound(_)
                | GameError::InvalidInput(_)
        )
    }

    /// Short message suitable for showing to the player.
    pub fn user_message(&self) -> String {
        match self {
            GameError::Unauthenticated => "Please sign in to play.".to_string(),
            GameError::InsufficientCredits { balance, required } => format!(
                "Not enough credits: this costs {} and you have {} (you need {} more credits).",
                required,
                balance,
                required.saturating_sub(*balance)
            ),
            GameError::UnknownTopic(id) => format!("There is no topic called '{}'.", id),
            GameError::UnknownProvider(id) => {
                format!("The AI provider '{}' is not available.", id)
            }
            GameError::SessionNotFound(id) => format!("No saved session '{}'.", id),
            GameError::InvalidInput(message) => message.clone(),
            GameError::AccountNotFound(_)
            | GameError::InvalidSessionState(_)
            | GameError::Storage(_) => "Something went wrong. Please try again later.".to_string(),
        }
    }
}

impl From<LedgerError> for GameError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::AccountNotFound(user_id) => GameError::AccountNotFound(user_id),
            LedgerError::InsufficientCredits { balance, required } => {
                GameError::InsufficientCredits { balance, required }
            }
            other => GameError::Storage(other.to_string()),
        }
    }
}

impl From<DomainError> for GameError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::InvalidSessionState { .. } => GameError::InvalidSessionState(error),
            DomainError::EmptyMessage
            | DomainError::InvalidDifficulty(_)
            | DomainError::InvalidCost { .. } => GameError::InvalidInput(error.to_string()),
            DomainError::UnsupportedSnapshotVersion(_) => GameError::Storage(error.to_string()),
        }
    }
}

impl From<SessionStoreError> for GameError {
    fn from(error: SessionStoreError) -> Self {
        GameError::Storage(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gameplan_domain::SessionPhase;

    #[test]
    fn insufficient_credits_message_names_the_shortfall() {
        let err = GameError::InsufficientCredits {
            balance: 1,
            required: 3,
        };
        assert!(err.is_user_facing());
        assert!(err.user_message().contains("you need 2 more credits"));
    }

    #[test]
    fn ledger_errors_map_onto_taxonomy() {
        let err: GameError = LedgerError::InsufficientCredits {
            balance: 0,
            required: 3,
        }
        .into();
        assert_eq!(
            err,
            GameError::InsufficientCredits {
                balance: 0,
                required: 3
            }
        );

        let err: GameError = LedgerError::Contention {
            user_id: UserId::new("u1"),
            attempts: 3,
        }
        .into();
        assert!(matches!(err, GameError::Storage(_)));
        assert!(!err.is_user_facing());
    }

    #[test]
    fn invalid_state_is_diagnostic() {
        let err: GameError = DomainError::InvalidSessionState {
            session_id: "s1".to_string(),
            expected: SessionPhase::Active,
            actual: SessionPhase::Ended,
        }
        .into();
        assert!(matches!(err, GameError::InvalidSessionState(_)));
        assert!(!err.is_user_facing());
    }

    #[test]
    fn empty_message_is_invalid_input() {
        let err: GameError = DomainError::EmptyMessage.into();
        assert!(matches!(err, GameError::InvalidInput(_)));
        assert!(err.is_user_facing());
    }
}
