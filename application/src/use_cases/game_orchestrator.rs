//! Game orchestrator: the single entry point for drivers.
//!
//! Resolves the signed-in user and topics, tracks open sessions, and is the
//! only place that decides whether an error is shown to the player or only
//! logged. Ledger failures are never retried here.

use super::credit_ledger::CreditLedger;
use super::error::GameError;
use super::session_manager::{MessageOutcome, SessionHandle, SessionManager, TopicChange};
use crate::ports::identity::IdentityPort;
use crate::ports::topic_catalog::TopicCatalog;
use gameplan_domain::{
    Difficulty, GameSession, MessageInput, ProviderId, SessionId, Topic, TopicId, UserId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

pub struct GameOrchestrator {
    identity: Arc<dyn IdentityPort>,
    catalog: Arc<dyn TopicCatalog>,
    ledger: Arc<CreditLedger>,
    sessions: SessionManager,
    open: Mutex<HashMap<SessionId, SessionHandle>>,
}

impl GameOrchestrator {
    pub fn new(
        identity: Arc<dyn IdentityPort>,
        catalog: Arc<dyn TopicCatalog>,
        ledger: Arc<CreditLedger>,
        sessions: SessionManager,
    ) -> Self {
        Self {
            identity,
            catalog,
            ledger,
            sessions,
            open: Mutex::new(HashMap::new()),
        }
    }

    /// Log diagnostics; pass every error through unchanged.
    fn observe<T>(&self, operation: &str, result: Result<T, GameError>) -> Result<T, GameError> {
        if let Err(err) = &result {
            if !err.is_user_facing() {
                error!("{} failed: {}", operation, err);
            }
        }
        result
    }

    pub fn current_user(&self) -> Result<UserId, GameError> {
        self.identity
            .current_user()
            .ok_or(GameError::Unauthenticated)
    }

    /// Make sure the signed-in user has an account; returns its balance.
    pub async fn open_account(&self) -> Result<u64, GameError> {
        let result = async {
            let user_id = self.current_user()?;
            Ok::<_, GameError>(self.ledger.open_account(&user_id).await?)
        }
        .await;
        self.observe("open_account", result)
    }

    pub async fn balance(&self) -> Result<u64, GameError> {
        let result = async {
            let user_id = self.current_user()?;
            Ok::<_, GameError>(self.ledger.get_balance(&user_id).await?)
        }
        .await;
        self.observe("balance", result)
    }

    pub fn topics(&self) -> Vec<Topic> {
        self.catalog.topics()
    }

    pub fn providers(&self) -> Vec<ProviderId> {
        self.sessions.providers().ids()
    }

    fn topic(&self, id: &TopicId) -> Result<Topic, GameError> {
        self.catalog
            .topic(id)
            .ok_or_else(|| GameError::UnknownTopic(id.clone()))
    }

    async fn track(&self, handle: SessionHandle) -> SessionHandle {
        self.open.lock().await.insert(handle.id(), handle.clone());
        handle
    }

    /// Open session owned by the signed-in user.
    async fn handle(&self, id: &SessionId) -> Result<SessionHandle, GameError> {
        let user_id = self.current_user()?;
        let open = self.open.lock().await;
        open.get(id)
            .filter(|handle| handle.snapshot().user_id() == &user_id)
            .cloned()
            .ok_or_else(|| GameError::SessionNotFound(id.clone()))
    }

    /// Start a session on `topic_id`; `provider` defaults to the configured one.
    pub async fn start_session(
        &self,
        topic_id: &TopicId,
        difficulty: Difficulty,
        provider: Option<ProviderId>,
    ) -> Result<GameSession, GameError> {
        let result = async {
            let user_id = self.current_user()?;
            let topic = self.topic(topic_id)?;
            let provider =
                provider.unwrap_or_else(|| self.sessions.providers().default_id().clone());
            let handle = self
                .sessions
                .start(&user_id, topic, difficulty, &provider)
                .await?;
            Ok::<_, GameError>(self.track(handle).await.snapshot())
        }
        .await;
        self.observe("start_session", result)
    }

    pub async fn send_message(
        &self,
        session_id: &SessionId,
        input: MessageInput,
    ) -> Result<MessageOutcome, GameError> {
        let result = async {
            let handle = self.handle(session_id).await?;
            self.sessions.send_message(&handle, input).await
        }
        .await;
        self.observe("send_message", result)
    }

    pub async fn change_difficulty(
        &self,
        session_id: &SessionId,
        difficulty: Difficulty,
    ) -> Result<GameSession, GameError> {
        let result = async {
            let handle = self.handle(session_id).await?;
            self.sessions.change_difficulty(&handle, difficulty)
        }
        .await;
        self.observe("change_difficulty", result)
    }

    /// Switch topics. The old session is returned ended and is no longer
    /// tracked; save it first to keep it.
    pub async fn change_topic(
        &self,
        session_id: &SessionId,
        topic_id: &TopicId,
    ) -> Result<(GameSession, GameSession), GameError> {
        let result = async {
            let handle = self.handle(session_id).await?;
            let topic = self.topic(topic_id)?;
            let TopicChange { previous, next } = self.sessions.change_topic(&handle, topic).await?;
            self.open.lock().await.remove(session_id);
            let next = self.track(next).await.snapshot();
            info!("Topic changed: {} -> {}", previous.id(), next.id());
            Ok::<_, GameError>((previous, next))
        }
        .await;
        self.observe("change_topic", result)
    }

    pub async fn save_session(&self, session_id: &SessionId) -> Result<(), GameError> {
        let result = async {
            let handle = self.handle(session_id).await?;
            self.sessions.save(&handle.snapshot()).await
        }
        .await;
        self.observe("save_session", result)
    }

    /// Load a saved session of the signed-in user and track it as open.
    pub async fn load_session(&self, session_id: &SessionId) -> Result<GameSession, GameError> {
        let result = async {
            let user_id = self.current_user()?;
            let handle = self.sessions.load(session_id).await?;
            if handle.snapshot().user_id() != &user_id {
                return Err(GameError::SessionNotFound(session_id.clone()));
            }
            Ok::<_, GameError>(self.track(handle).await.snapshot())
        }
        .await;
        self.observe("load_session", result)
    }

    pub async fn session(&self, session_id: &SessionId) -> Result<GameSession, GameError> {
        let result = self.handle(session_id).await.map(|handle| handle.snapshot());
        self.observe("session", result)
    }

    /// End and forget an open session.
    pub async fn close_session(&self, session_id: &SessionId) -> Result<GameSession, GameError> {
        let result = async {
            let handle = self.handle(session_id).await?;
            let ended = self.sessions.end(&handle).await?;
            self.open.lock().await.remove(session_id);
            Ok::<_, GameError>(ended)
        }
        .await;
        self.observe("close_session", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameParams;
    use crate::ports::identity::FixedIdentity;
    use crate::ports::provider_transport::TransportKind;
    use crate::use_cases::provider_adapter::ProviderRegistry;
    use crate::use_cases::test_support::{
        MemoryLedgerStore, MemorySessionStore, ScriptedTransport, Step, direct_provider,
    };
    use gameplan_domain::{ResponseSource, SessionPhase};

    struct Catalog;

    impl TopicCatalog for Catalog {
        fn topics(&self) -> Vec<Topic> {
            vec![
                Topic::new("intro-ai", "Intro to AI", ""),
                Topic::new("ai-ethics", "AI Ethics", ""),
            ]
        }
    }

    fn orchestrator(identity: FixedIdentity, balance: u64, steps: Vec<Step>) -> GameOrchestrator {
        let store = MemoryLedgerStore::with_balance("u1", balance);
        let ledger = Arc::new(CreditLedger::new(store, 20));
        let provider = direct_provider(ScriptedTransport::new(
            "chat",
            TransportKind::ChatCompletions,
            steps,
        ));
        let registry = ProviderRegistry::new(provider.id().clone()).with_provider(provider);
        let sessions = SessionManager::new(
            ledger.clone(),
            registry,
            Arc::new(MemorySessionStore::default()),
            GameParams::default(),
        );
        GameOrchestrator::new(Arc::new(identity), Arc::new(Catalog), ledger, sessions)
    }

    fn signed_in() -> FixedIdentity {
        FixedIdentity::signed_in(UserId::new("u1"))
    }

    #[tokio::test]
    async fn anonymous_user_cannot_start() {
        let game = orchestrator(FixedIdentity::anonymous(), 10, vec![]);
        let err = game
            .start_session(&TopicId::new("intro-ai"), Difficulty::Easy, None)
            .await
            .unwrap_err();
        assert_eq!(err, GameError::Unauthenticated);
        assert!(err.is_user_facing());
    }

    #[tokio::test]
    async fn unknown_topic_is_reported() {
        let game = orchestrator(signed_in(), 10, vec![]);
        let err = game
            .start_session(&TopicId::new("quantum"), Difficulty::Easy, None)
            .await
            .unwrap_err();
        assert_eq!(err, GameError::UnknownTopic(TopicId::new("quantum")));
    }

    #[tokio::test]
    async fn unknown_provider_is_reported() {
        let game = orchestrator(signed_in(), 10, vec![]);
        let err = game
            .start_session(
                &TopicId::new("intro-ai"),
                Difficulty::Easy,
                Some(ProviderId::new("other")),
            )
            .await
            .unwrap_err();
        assert_eq!(err, GameError::UnknownProvider(ProviderId::new("other")));
        assert_eq!(game.balance().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn full_game_flow() {
        let game = orchestrator(
            signed_in(),
            10,
            vec![
                Step::Reply("Welcome!"),
                Step::Reply("Good question."),
                Step::Reply("Let's talk ethics."),
            ],
        );
        let session = game
            .start_session(&TopicId::new("intro-ai"), Difficulty::Easy, None)
            .await
            .unwrap();
        let id = session.id().clone();
        assert_eq!(game.balance().await.unwrap(), 7);

        let outcome = game
            .send_message(&id, MessageInput::text("What is AI?"))
            .await
            .unwrap();
        assert_eq!(outcome.source, ResponseSource::Primary);
        assert_eq!(outcome.reply.content, "Good question.");
        assert_eq!(outcome.balance, 6);

        game.change_difficulty(&id, Difficulty::Hard).await.unwrap();
        game.save_session(&id).await.unwrap();

        let (previous, next) = game
            .change_topic(&id, &TopicId::new("ai-ethics"))
            .await
            .unwrap();
        assert_eq!(previous.phase(), SessionPhase::Ended);
        assert_eq!(next.difficulty(), Difficulty::Hard);
        assert!(matches!(
            game.session(&id).await,
            Err(GameError::SessionNotFound(_))
        ));

        let reloaded = game.load_session(&id).await.unwrap();
        assert_eq!(reloaded.phase(), SessionPhase::Active);
        assert_eq!(reloaded.history().len(), 4);

        let ended = game.close_session(next.id()).await.unwrap();
        assert_eq!(ended.phase(), SessionPhase::Ended);
        assert_eq!(game.balance().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn open_account_seeds_new_user_once() {
        let game = orchestrator(FixedIdentity::signed_in(UserId::new("new")), 10, vec![]);
        assert_eq!(
            game.balance().await.unwrap_err(),
            GameError::AccountNotFound(UserId::new("new"))
        );
        assert_eq!(game.open_account().await.unwrap(), 20);
        assert_eq!(game.open_account().await.unwrap(), 20);
    }
}
