//! Game session entity and its lifecycle

use super::entities::{ConversationMessage, Role};
use super::response::ResponseSource;
use crate::content::topic::Topic;
use crate::core::error::DomainError;
use crate::core::id::generate_id;
use crate::credits::account::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique session identifier; generated locally or assigned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new local session id.
    pub fn generate() -> Self {
        Self(generate_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a configured provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Difficulty level of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Intermediate,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "beginner" => Ok(Difficulty::Easy),
            "intermediate" | "medium" => Ok(Difficulty::Intermediate),
            "hard" | "advanced" => Ok(Difficulty::Hard),
            other => Err(DomainError::InvalidDifficulty(other.to_string())),
        }
    }
}

/// Lifecycle phase: `Uninitialized -> Active -> (Active | Ended)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Uninitialized,
    Active,
    Ended,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Active => "active",
            SessionPhase::Ended => "ended",
        };
        write!(f, "{}", s)
    }
}

/// One topic/difficulty-scoped learning conversation (Entity)
///
/// History is append-only. `degraded` is sticky: once a synthetic reply has
/// entered the session it stays `true` for the session's life.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    pub(crate) id: SessionId,
    pub(crate) user_id: UserId,
    pub(crate) topic: Topic,
    pub(crate) difficulty: Difficulty,
    pub(crate) provider_id: ProviderId,
    pub(crate) history: Vec<ConversationMessage>,
    pub(crate) credits_used: u64,
    pub(crate) degraded: bool,
    pub(crate) phase: SessionPhase,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl GameSession {
    /// A session that has not yet been started.
    pub fn new(
        id: SessionId,
        user_id: UserId,
        topic: Topic,
        difficulty: Difficulty,
        provider_id: ProviderId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            topic,
            difficulty,
            provider_id,
            history: Vec::new(),
            credits_used: 0,
            degraded: false,
            phase: SessionPhase::Uninitialized,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn provider_id(&self) -> &ProviderId {
        &self.provider_id
    }

    pub fn history(&self) -> &[ConversationMessage] {
        &self.history
    }

    /// The last `window` messages, which is what providers get to see.
    pub fn history_tail(&self, window: usize) -> &[ConversationMessage] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }

    pub fn credits_used(&self) -> u64 {
        self.credits_used
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn require_phase(&self, expected: SessionPhase) -> Result<(), DomainError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(DomainError::InvalidSessionState {
                session_id: self.id.to_string(),
                expected,
                actual: self.phase,
            })
        }
    }

    /// Replace the locally generated id with one assigned by the provider.
    ///
    /// Only meaningful before the session starts.
    pub fn assign_id(&mut self, id: SessionId) -> Result<(), DomainError> {
        self.require_phase(SessionPhase::Uninitialized)?;
        self.id = id;
        Ok(())
    }

    /// `Uninitialized -> Active`, with the greeting as first assistant message.
    pub fn begin(
        &mut self,
        greeting: impl Into<String>,
        source: ResponseSource,
        cost: u64,
    ) -> Result<(), DomainError> {
        self.require_phase(SessionPhase::Uninitialized)?;
        self.phase = SessionPhase::Active;
        self.push_reply(greeting.into(), source, cost);
        Ok(())
    }

    /// Append a user message; returns its position in history.
    pub fn push_user(&mut self, message: ConversationMessage) -> Result<usize, DomainError> {
        self.require_phase(SessionPhase::Active)?;
        self.history.push(message);
        self.touch();
        Ok(self.history.len() - 1)
    }

    /// Conversation a provider sees when answering the user message at
    /// `position`: the last `window` messages before it, leaving out that
    /// message and any user messages queued after it.
    pub fn context_for(&self, position: usize, window: usize) -> Vec<ConversationMessage> {
        let context: Vec<&ConversationMessage> = self
            .history
            .iter()
            .enumerate()
            .filter(|(i, m)| !(m.role == Role::User && *i >= position))
            .map(|(_, m)| m)
            .collect();
        let start = context.len().saturating_sub(window);
        context[start..].iter().map(|m| (*m).clone()).collect()
    }

    pub fn record_reply(
        &mut self,
        text: impl Into<String>,
        source: ResponseSource,
        cost: u64,
    ) -> Result<(), DomainError> {
        self.require_phase(SessionPhase::Active)?;
        self.push_reply(text.into(), source, cost);
        Ok(())
    }

    /// Switch difficulty and append one system marker describing the change.
    ///
    /// Returns `false` (and appends nothing) when the difficulty is unchanged.
    pub fn change_difficulty(&mut self, difficulty: Difficulty) -> Result<bool, DomainError> {
        self.require_phase(SessionPhase::Active)?;
        if self.difficulty == difficulty {
            return Ok(false);
        }
        let marker = format!(
            "Difficulty changed from {} to {}. Adjust explanations and questions to the {} level from here on.",
            self.difficulty, difficulty, difficulty
        );
        self.difficulty = difficulty;
        self.history.push(ConversationMessage::system(marker));
        self.touch();
        Ok(true)
    }

    /// `Active -> Ended`.
    pub fn end(&mut self) -> Result<(), DomainError> {
        self.require_phase(SessionPhase::Active)?;
        self.phase = SessionPhase::Ended;
        self.touch();
        Ok(())
    }

    fn push_reply(&mut self, text: String, source: ResponseSource, cost: u64) {
        self.history.push(ConversationMessage::assistant(text, source));
        self.credits_used += cost;
        if source.is_synthetic() {
            self.degraded = true;
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_session() -> GameSession {
        GameSession::new(
            SessionId::new("s-1"),
            UserId::new("u-1"),
            Topic::new("intro-ai", "Intro to AI", "What AI is and is not"),
            Difficulty::Easy,
            ProviderId::new("rpc"),
        )
    }

    fn active_session() -> GameSession {
        let mut session = new_session();
        session.begin("Welcome!", ResponseSource::Primary, 3).unwrap();
        session
    }

    #[test]
    fn begin_activates_with_greeting() {
        let session = active_session();
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].role, Role::Assistant);
        assert_eq!(session.credits_used(), 3);
        assert!(!session.is_degraded());
    }

    #[test]
    fn user_message_requires_active() {
        let mut session = new_session();
        let err = session
            .push_user(ConversationMessage::user("hello"))
            .unwrap_err();
        assert!(err.is_invalid_state());
        assert!(session.history().is_empty());
    }

    #[test]
    fn degraded_is_sticky() {
        let mut session = active_session();
        session
            .record_reply("offline", ResponseSource::Synthetic, 1)
            .unwrap();
        assert!(session.is_degraded());
        session
            .record_reply("back online", ResponseSource::Primary, 1)
            .unwrap();
        assert!(session.is_degraded());
    }

    #[test]
    fn secondary_reply_does_not_degrade() {
        let mut session = active_session();
        session
            .record_reply("from callable", ResponseSource::Secondary, 1)
            .unwrap();
        assert!(!session.is_degraded());
    }

    #[test]
    fn change_difficulty_appends_one_system_marker() {
        let mut session = active_session();
        assert!(session.change_difficulty(Difficulty::Hard).unwrap());
        assert_eq!(session.difficulty(), Difficulty::Hard);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].role, Role::System);
        assert!(session.history()[1].content.contains("from easy to hard"));
        assert_eq!(session.credits_used(), 3);
    }

    #[test]
    fn unchanged_difficulty_is_a_no_op() {
        let mut session = active_session();
        assert!(!session.change_difficulty(Difficulty::Easy).unwrap());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn ended_session_rejects_messages() {
        let mut session = active_session();
        session.end().unwrap();
        assert!(session.push_user(ConversationMessage::user("x")).is_err());
        assert!(session.change_difficulty(Difficulty::Hard).is_err());
        assert!(session.end().is_err());
    }

    #[test]
    fn history_tail_is_bounded() {
        let mut session = active_session();
        for i in 0..5 {
            session
                .push_user(ConversationMessage::user(format!("m{}", i)))
                .unwrap();
        }
        let tail = session.history_tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1].content, "m4");
        assert_eq!(session.history_tail(100).len(), 6);
    }

    #[test]
    fn context_skips_queued_user_messages() {
        let mut session = active_session();
        let first = session
            .push_user(ConversationMessage::user("first"))
            .unwrap();
        let second = session
            .push_user(ConversationMessage::user("second"))
            .unwrap();

        let ctx = session.context_for(first, 10);
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx[0].content, "Welcome!");

        session
            .record_reply("answer to first", ResponseSource::Primary, 1)
            .unwrap();
        let ctx = session.context_for(second, 10);
        let contents: Vec<&str> = ctx.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["Welcome!", "first", "answer to first"]);
        assert_eq!(session.context_for(second, 1).len(), 1);
    }

    #[test]
    fn provider_assigned_id_only_before_start() {
        let mut session = new_session();
        session.assign_id(SessionId::new("remote-7")).unwrap();
        assert_eq!(session.id().as_str(), "remote-7");
        session.begin("hi", ResponseSource::Primary, 3).unwrap();
        assert!(session.assign_id(SessionId::new("other")).is_err());
    }

    #[test]
    fn difficulty_parses_aliases() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!("medium".parse::<Difficulty>().unwrap(), Difficulty::Intermediate);
        assert!("expert".parse::<Difficulty>().is_err());
    }
}
