//! Session lifecycle use case.
//!
//! Every credit-consuming operation follows the same shape:
//!
//! ```text
//! reserve cost ──► fallback chain ──► commit ──► update session
//!      │                                 │
//!      └─ InsufficientCredits            └─ failure: release, no update
//! ```
//!
//! The chain always produces a value (remote or synthetic), so once the
//! reservation succeeds the operation only fails on ledger or state errors.

use super::credit_ledger::CreditLedger;
use super::error::GameError;
use super::fallback_chain::TransportFallbackChain;
use super::provider_adapter::{ProviderAdapter, ProviderRegistry};
use super::turn_queue::TurnQueue;
use crate::config::GameParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::provider_transport::{ProviderReply, ProviderSessionSeed};
use crate::ports::session_store::SessionStore;
use futures::FutureExt;
use gameplan_domain::util::preview;
use gameplan_domain::{
    ConversationMessage, Difficulty, DomainError, GameSession, MessageInput, OperationKind,
    ProviderId, Reservation, ResponseSource, SessionId, SessionPhase, Topic, UserId,
    synthetic_greeting, synthetic_reply,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Live session plus the machinery that serializes its turns.
///
/// Cloning the handle shares the session.
#[derive(Clone)]
pub struct SessionHandle {
    session: Arc<Mutex<GameSession>>,
    turns: Arc<TurnQueue>,
    provider: Arc<ProviderAdapter>,
}

impl SessionHandle {
    fn new(session: GameSession, provider: Arc<ProviderAdapter>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            turns: TurnQueue::new(),
            provider,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GameSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> SessionId {
        self.lock().id().clone()
    }

    /// Point-in-time copy of the session.
    pub fn snapshot(&self) -> GameSession {
        self.lock().clone()
    }

    pub fn provider_id(&self) -> &ProviderId {
        self.provider.id()
    }

    /// Messages accepted but not yet answered.
    pub fn pending_turns(&self) -> u64 {
        self.turns.pending()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session", &self.id())
            .field("provider", self.provider.id())
            .finish()
    }
}

/// Result of one `send_message`.
#[derive(Debug, Clone)]
pub struct MessageOutcome {
    pub reply: ConversationMessage,
    pub source: ResponseSource,
    pub credits_charged: u64,
    /// Balance of record after the debit.
    pub balance: u64,
    pub session: GameSession,
}

/// Result of `change_topic`.
#[derive(Debug, Clone)]
pub struct TopicChange {
    /// The old session, now ended.
    pub previous: GameSession,
    pub next: SessionHandle,
}

pub struct SessionManager {
    ledger: Arc<CreditLedger>,
    providers: ProviderRegistry,
    store: Arc<dyn SessionStore>,
    chain: TransportFallbackChain,
    params: GameParams,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl SessionManager {
    pub fn new(
        ledger: Arc<CreditLedger>,
        providers: ProviderRegistry,
        store: Arc<dyn SessionStore>,
        params: GameParams,
    ) -> Self {
        Self {
            ledger,
            providers,
            store,
            chain: TransportFallbackChain::new(params.chain.clone()),
            params,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.chain = TransportFallbackChain::new(self.params.chain.clone())
            .with_conversation_logger(logger.clone());
        self.conversation_logger = logger;
        self
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn params(&self) -> &GameParams {
        &self.params
    }

    fn provider(&self, id: &ProviderId) -> Result<Arc<ProviderAdapter>, GameError> {
        self.providers
            .get(id)
            .ok_or_else(|| GameError::UnknownProvider(id.clone()))
    }

    /// Commit, or release and fail.
    async fn settle(&self, reservation: &Reservation) -> Result<u64, GameError> {
        match self.ledger.commit(reservation).await {
            Ok(balance) => {
                self.conversation_logger.log(ConversationEvent::new(
                    "credits_committed",
                    serde_json::json!({
                        "user_id": reservation.user_id().as_str(),
                        "operation": reservation.kind().as_str(),
                        "amount": reservation.amount(),
                        "balance": balance,
                    }),
                ));
                Ok(balance)
            }
            Err(err) => {
                warn!("Commit of {} failed: {}", reservation.id(), err);
                self.ledger.release(reservation).await;
                Err(err.into())
            }
        }
    }

    /// Open a new session; its first message is the provider's greeting.
    pub async fn start(
        &self,
        user_id: &UserId,
        topic: Topic,
        difficulty: Difficulty,
        provider_id: &ProviderId,
    ) -> Result<SessionHandle, GameError> {
        let provider = self.provider(provider_id)?;
        let cost = self.params.costs.cost(OperationKind::Initialize);
        let reservation = self
            .ledger
            .try_reserve(user_id, OperationKind::Initialize, cost)
            .await?;

        let mut session = GameSession::new(
            SessionId::generate(),
            user_id.clone(),
            topic,
            difficulty,
            provider_id.clone(),
        );
        let request = provider.initialize_request(&session);
        let adapter: &ProviderAdapter = &provider;
        let request_ref = &request;
        let outcome = self
            .chain
            .execute(
                adapter,
                OperationKind::Initialize,
                move |attempt| adapter.initialize(attempt, request_ref).boxed(),
                || ProviderSessionSeed::new(synthetic_greeting(session.topic(), difficulty)),
            )
            .await;

        self.settle(&reservation).await?;

        let seed = outcome.value;
        if let Some(remote_id) = seed.session_id {
            session.assign_id(remote_id)?;
        }
        session.begin(seed.greeting, outcome.source, cost)?;

        info!(
            "Session {} started on '{}' ({}) via {} [{}]",
            session.id(),
            session.topic().name,
            difficulty,
            provider_id,
            outcome.source
        );
        self.conversation_logger.log(ConversationEvent::new(
            "session_started",
            serde_json::json!({
                "session_id": session.id().as_str(),
                "user_id": user_id.as_str(),
                "topic": session.topic().id.as_str(),
                "difficulty": difficulty.as_str(),
                "provider": provider_id.as_str(),
                "source": outcome.source.as_str(),
            }),
        ));
        Ok(SessionHandle::new(session, provider))
    }

    /// Append `input` and the reply to it.
    ///
    /// The user message is appended before credits are checked and stays
    /// even when the reservation fails. Replies land in the order messages
    /// were accepted.
    pub async fn send_message(
        &self,
        handle: &SessionHandle,
        input: MessageInput,
    ) -> Result<MessageOutcome, GameError> {
        if input.is_blank() {
            return Err(DomainError::EmptyMessage.into());
        }
        let kind = input.kind();
        let cost = self.params.costs.cost(kind);
        let message = input.to_message();

        let (position, ticket, user_id, session_id) = {
            let mut session = handle.lock();
            let position = session.push_user(message.clone())?;
            (
                position,
                handle.turns.issue(),
                session.user_id().clone(),
                session.id().clone(),
            )
        };
        self.conversation_logger.log(ConversationEvent::new(
            "message_sent",
            serde_json::json!({
                "session_id": session_id.as_str(),
                "operation": kind.as_str(),
                "content": message.content,
            }),
        ));

        let reservation = self.ledger.try_reserve(&user_id, kind, cost).await?;

        let turn = ticket.wait().await;
        debug!("Turn {} on session {}", position, session_id);

        let prepared = {
            let session = handle.lock();
            session.require_phase(SessionPhase::Active).map(|()| {
                let history = session.context_for(position, self.params.history_window);
                (
                    handle.provider.message_request(&session, message, history),
                    session.topic().clone(),
                    session.difficulty(),
                )
            })
        };
        let (request, topic, difficulty) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                self.ledger.release(&reservation).await;
                return Err(err.into());
            }
        };

        let adapter: &ProviderAdapter = &handle.provider;
        let request_ref = &request;
        let outcome = self
            .chain
            .execute(
                adapter,
                kind,
                move |attempt| adapter.send_message(attempt, request_ref).boxed(),
                || ProviderReply::new(synthetic_reply(&topic, difficulty, input.content())),
            )
            .await;

        let balance = self.settle(&reservation).await?;

        let session = {
            let mut session = handle.lock();
            session.record_reply(outcome.value.text.clone(), outcome.source, cost)?;
            session.clone()
        };
        drop(turn);

        debug!(
            "Reply on {} [{}]: {}",
            session_id,
            outcome.source,
            preview(&outcome.value.text, 80)
        );
        self.conversation_logger.log(ConversationEvent::new(
            "reply_received",
            serde_json::json!({
                "session_id": session_id.as_str(),
                "source": outcome.source.as_str(),
                "transport": outcome.transport,
                "content": outcome.value.text,
                "credits_charged": cost,
            }),
        ));

        let reply = session
            .history()
            .last()
            .cloned()
            .unwrap_or_else(|| ConversationMessage::assistant(outcome.value.text, outcome.source));
        Ok(MessageOutcome {
            reply,
            source: outcome.source,
            credits_charged: cost,
            balance,
            session,
        })
    }

    /// Switch difficulty. Appends one system marker; never calls a provider
    /// or touches credits.
    pub fn change_difficulty(
        &self,
        handle: &SessionHandle,
        difficulty: Difficulty,
    ) -> Result<GameSession, GameError> {
        let mut session = handle.lock();
        let previous = session.difficulty();
        if session.change_difficulty(difficulty)? {
            info!(
                "Session {} difficulty {} -> {}",
                session.id(),
                previous,
                difficulty
            );
            self.conversation_logger.log(ConversationEvent::new(
                "difficulty_changed",
                serde_json::json!({
                    "session_id": session.id().as_str(),
                    "from": previous.as_str(),
                    "to": difficulty.as_str(),
                }),
            ));
        }
        Ok(session.clone())
    }

    /// End the current session and start a new one on `topic` with the same
    /// difficulty and provider.
    ///
    /// Waits for queued messages first. If the new session cannot be
    /// started, the current one stays active.
    pub async fn change_topic(
        &self,
        handle: &SessionHandle,
        topic: Topic,
    ) -> Result<TopicChange, GameError> {
        let ticket = {
            let session = handle.lock();
            session.require_phase(SessionPhase::Active)?;
            handle.turns.issue()
        };
        let _turn = ticket.wait().await;

        let (user_id, difficulty, provider_id, from) = {
            let session = handle.lock();
            session.require_phase(SessionPhase::Active)?;
            (
                session.user_id().clone(),
                session.difficulty(),
                session.provider_id().clone(),
                session.topic().id.clone(),
            )
        };

        let to = topic.id.clone();
        let next = self.start(&user_id, topic, difficulty, &provider_id).await?;

        let previous = {
            let mut session = handle.lock();
            session.end()?;
            session.clone()
        };
        self.conversation_logger.log(ConversationEvent::new(
            "topic_changed",
            serde_json::json!({
                "previous_session_id": previous.id().as_str(),
                "session_id": next.id().as_str(),
                "from": from.as_str(),
                "to": to.as_str(),
            }),
        ));
        Ok(TopicChange { previous, next })
    }

    /// End the session once queued messages are answered.
    pub async fn end(&self, handle: &SessionHandle) -> Result<GameSession, GameError> {
        let ticket = handle.turns.issue();
        let _turn = ticket.wait().await;
        let mut session = handle.lock();
        session.end()?;
        debug!("Session {} ended", session.id());
        Ok(session.clone())
    }

    /// Persist a snapshot of `session`.
    pub async fn save(&self, session: &GameSession) -> Result<(), GameError> {
        if session.phase() == SessionPhase::Uninitialized {
            return Err(GameError::InvalidSessionState(
                DomainError::InvalidSessionState {
                    session_id: session.id().to_string(),
                    expected: SessionPhase::Active,
                    actual: SessionPhase::Uninitialized,
                },
            ));
        }
        let snapshot = session.snapshot();
        self.store.put(session.id(), &snapshot).await?;
        info!(
            "Saved session {} ({} messages)",
            session.id(),
            snapshot.history.len()
        );
        self.conversation_logger.log(ConversationEvent::new(
            "session_saved",
            serde_json::json!({
                "session_id": session.id().as_str(),
                "messages": snapshot.history.len(),
            }),
        ));
        Ok(())
    }

    /// Rebuild an active session from the store.
    pub async fn load(&self, session_id: &SessionId) -> Result<SessionHandle, GameError> {
        let snapshot = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| GameError::SessionNotFound(session_id.clone()))?;
        let session = GameSession::restore(snapshot)?;
        let provider = self.provider(session.provider_id())?;
        info!(
            "Loaded session {} ({} messages, provider {})",
            session.id(),
            session.history().len(),
            provider.id()
        );
        self.conversation_logger.log(ConversationEvent::new(
            "session_loaded",
            serde_json::json!({
                "session_id": session.id().as_str(),
                "messages": session.history().len(),
            }),
        ));
        Ok(SessionHandle::new(session, provider))
    }
}
