//! Serializable session snapshot

use super::entities::ConversationMessage;
use super::game_session::{Difficulty, GameSession, ProviderId, SessionId, SessionPhase};
use crate::content::topic::Topic;
use crate::core::error::DomainError;
use crate::credits::account::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to rebuild a [`GameSession`] (persistence format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionSnapshot {
    pub version: u32,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub provider_id: ProviderId,
    pub history: Vec<ConversationMessage>,
    pub credits_used: u64,
    pub degraded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameSession {
    /// Capture a complete, consistent snapshot of this session.
    pub fn snapshot(&self) -> GameSessionSnapshot {
        GameSessionSnapshot {
            version: SNAPSHOT_VERSION,
            session_id: self.id.clone(),
            user_id: self.user_id.clone(),
            topic: self.topic.clone(),
            difficulty: self.difficulty,
            provider_id: self.provider_id.clone(),
            history: self.history.clone(),
            credits_used: self.credits_used,
            degraded: self.degraded,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Rebuild an `Active` session from a stored snapshot.
    pub fn restore(snapshot: GameSessionSnapshot) -> Result<Self, DomainError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DomainError::UnsupportedSnapshotVersion(snapshot.version));
        }
        Ok(Self {
            id: snapshot.session_id,
            user_id: snapshot.user_id,
            topic: snapshot.topic,
            difficulty: snapshot.difficulty,
            provider_id: snapshot.provider_id,
            history: snapshot.history,
            credits_used: snapshot.credits_used,
            degraded: snapshot.degraded,
            phase: SessionPhase::Active,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::response::ResponseSource;

    fn sample() -> GameSession {
        let mut session = GameSession::new(
            SessionId::new("s-9"),
            UserId::new("u-9"),
            Topic::new("ml", "Machine Learning", "Learning from data"),
            Difficulty::Intermediate,
            ProviderId::new("direct"),
        );
        session.begin("Hello", ResponseSource::Primary, 3).unwrap();
        session
            .push_user(ConversationMessage::user("What is overfitting?"))
            .unwrap();
        session
            .record_reply("offline reply", ResponseSource::Synthetic, 1)
            .unwrap();
        session
    }

    #[test]
    fn restore_reproduces_session_as_active() {
        let mut original = sample();
        original.end().unwrap();

        let json = serde_json::to_string(&original.snapshot()).unwrap();
        let snapshot: GameSessionSnapshot = serde_json::from_str(&json).unwrap();
        let restored = GameSession::restore(snapshot).unwrap();

        assert_eq!(restored.phase(), SessionPhase::Active);
        assert_eq!(restored.id(), original.id());
        assert_eq!(restored.topic(), original.topic());
        assert_eq!(restored.difficulty(), original.difficulty());
        assert_eq!(restored.provider_id(), original.provider_id());
        assert_eq!(restored.history(), original.history());
        assert_eq!(restored.credits_used(), 4);
        assert!(restored.is_degraded());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut snapshot = sample().snapshot();
        snapshot.version = 99;
        assert_eq!(
            GameSession::restore(snapshot).unwrap_err(),
            DomainError::UnsupportedSnapshotVersion(99)
        );
    }

    #[test]
    fn snapshot_uses_camel_case_fields() {
        let value = serde_json::to_value(sample().snapshot()).unwrap();
        assert!(value.get("sessionId").is_some());
        assert!(value.get("providerId").is_some());
        assert_eq!(value["difficulty"], "intermediate");
    }
}
