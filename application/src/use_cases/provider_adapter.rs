//! Provider adapters.
//!
//! A provider is a closed set of backend families, each owning an ordered
//! list of transport attempts. Adapters shape requests for their family and
//! normalize responses; they never catch errors. Retry and fallback policy
//! lives in [`TransportFallbackChain`](super::fallback_chain::TransportFallbackChain).

use crate::ports::provider_transport::{
    ChatMessage, ChatPrompt, InitializeRequest, MessageRequest, ProviderReply,
    ProviderSessionSeed, ProviderTransport, TransportError, TransportKind,
};
use gameplan_domain::{
    Attachment, ConversationMessage, Difficulty, GameSession, ProviderId, Role, Topic,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Default time an attempt may take before the chain moves on.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// One step of a provider's transport plan.
#[derive(Clone)]
pub struct TransportAttempt {
    pub transport: Arc<dyn ProviderTransport>,
    pub timeout: Duration,
}

impl TransportAttempt {
    pub fn new(transport: Arc<dyn ProviderTransport>) -> Self {
        Self {
            transport,
            timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for TransportAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportAttempt")
            .field("transport", &self.transport.name())
            .field("kind", &self.transport.kind())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Backend family of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    Rpc,
    DirectApi,
}

/// Managed inference service reached through an intermediary call layer
/// (HTTP endpoint first, callable RPC second).
#[derive(Debug, Clone)]
pub struct RpcProvider {
    pub id: ProviderId,
    pub attempts: Vec<TransportAttempt>,
}

/// Third-party chat-completions API.
#[derive(Debug, Clone)]
pub struct DirectApiProvider {
    pub id: ProviderId,
    pub attempts: Vec<TransportAttempt>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl DirectApiProvider {
    fn system_prompt(topic: &Topic, difficulty: Difficulty) -> String {
        let level = match difficulty {
            Difficulty::Easy => "Use plain language and everyday examples.",
            Difficulty::Intermediate => "Assume the basics are known and build on them.",
            Difficulty::Hard => "Go deep, use precise terminology and challenge the learner.",
        };
        format!(
            "You are a friendly tutor running a learning game about \"{}\". {} \
             The learner chose the {} difficulty. {} Keep answers short and end \
             with a question that keeps the game going.",
            topic.name,
            topic.description.trim(),
            difficulty,
            level
        )
    }

    fn chat_message(message: &ConversationMessage) -> ChatMessage {
        let content = match &message.attachment {
            None => message.content.clone(),
            Some(Attachment::Image { uri }) => format!("{}\n[image: {}]", message.content, uri),
            Some(Attachment::Audio { uri }) => {
                format!("{}\n[audio transcript of {}]", message.content, uri)
            }
        };
        ChatMessage::new(message.role, content)
    }

    fn opening_prompt(&self, topic: &Topic, difficulty: Difficulty) -> ChatPrompt {
        ChatPrompt {
            messages: vec![
                ChatMessage::new(Role::System, Self::system_prompt(topic, difficulty)),
                ChatMessage::new(
                    Role::User,
                    format!(
                        "Start a {} lesson on {}. Greet me and ask an opening question.",
                        difficulty, topic.name
                    ),
                ),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn reply_prompt(
        &self,
        topic: &Topic,
        difficulty: Difficulty,
        history: &[ConversationMessage],
        message: &ConversationMessage,
    ) -> ChatPrompt {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::new(
            Role::System,
            Self::system_prompt(topic, difficulty),
        ));
        messages.extend(history.iter().map(Self::chat_message));
        messages.push(Self::chat_message(message));
        ChatPrompt {
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// A configured provider (closed set of backend families).
#[derive(Debug, Clone)]
pub enum ProviderAdapter {
    Rpc(RpcProvider),
    DirectApi(DirectApiProvider),
}

impl ProviderAdapter {
    pub fn id(&self) -> &ProviderId {
        match self {
            ProviderAdapter::Rpc(p) => &p.id,
            ProviderAdapter::DirectApi(p) => &p.id,
        }
    }

    pub fn family(&self) -> ProviderFamily {
        match self {
            ProviderAdapter::Rpc(_) => ProviderFamily::Rpc,
            ProviderAdapter::DirectApi(_) => ProviderFamily::DirectApi,
        }
    }

    /// Transport attempts in priority order.
    pub fn attempts(&self) -> &[TransportAttempt] {
        match self {
            ProviderAdapter::Rpc(p) => &p.attempts,
            ProviderAdapter::DirectApi(p) => &p.attempts,
        }
    }

    /// Shape the request that opens `session` on this provider.
    pub fn initialize_request(&self, session: &GameSession) -> InitializeRequest {
        let chat = match self {
            ProviderAdapter::Rpc(_) => None,
            ProviderAdapter::DirectApi(p) => {
                Some(p.opening_prompt(session.topic(), session.difficulty()))
            }
        };
        InitializeRequest {
            user_id: session.user_id().clone(),
            session_id: session.id().clone(),
            topic: session.topic().clone(),
            difficulty: session.difficulty(),
            chat,
        }
    }

    /// Shape the request that answers `message` given the preceding `history`.
    pub fn message_request(
        &self,
        session: &GameSession,
        message: ConversationMessage,
        history: Vec<ConversationMessage>,
    ) -> MessageRequest {
        let chat = match self {
            ProviderAdapter::Rpc(_) => None,
            ProviderAdapter::DirectApi(p) => Some(p.reply_prompt(
                session.topic(),
                session.difficulty(),
                &history,
                &message,
            )),
        };
        MessageRequest {
            user_id: session.user_id().clone(),
            session_id: session.id().clone(),
            topic: session.topic().clone(),
            difficulty: session.difficulty(),
            message,
            history,
            chat,
        }
    }

    /// Open a session through one transport.
    pub async fn initialize(
        &self,
        attempt: &TransportAttempt,
        request: &InitializeRequest,
    ) -> Result<ProviderSessionSeed, TransportError> {
        self.check_transport(attempt)?;
        let mut seed = attempt.transport.initialize(request).await?;
        seed.greeting = non_empty(seed.greeting, "greeting")?;
        if self.family() == ProviderFamily::DirectApi {
            // chat-completions has no session concept
            seed.session_id = None;
        }
        Ok(seed)
    }

    /// Get a reply through one transport.
    pub async fn send_message(
        &self,
        attempt: &TransportAttempt,
        request: &MessageRequest,
    ) -> Result<ProviderReply, TransportError> {
        self.check_transport(attempt)?;
        let mut reply = attempt.transport.send_message(request).await?;
        reply.text = non_empty(reply.text, "reply")?;
        Ok(reply)
    }

    fn check_transport(&self, attempt: &TransportAttempt) -> Result<(), TransportError> {
        let kind = attempt.transport.kind();
        let supported = match self.family() {
            ProviderFamily::Rpc => {
                matches!(kind, TransportKind::HttpEndpoint | TransportKind::CallableRpc)
            }
            ProviderFamily::DirectApi => kind == TransportKind::ChatCompletions,
        };
        if supported {
            Ok(())
        } else {
            Err(TransportError::NotConfigured(format!(
                "{} transport cannot serve provider {}",
                kind,
                self.id()
            )))
        }
    }
}

fn non_empty(text: String, what: &str) -> Result<String, TransportError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(TransportError::MalformedResponse(format!("empty {}", what)))
    } else if trimmed.len() == text.len() {
        Ok(text)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Providers selected by explicit configuration.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, Arc<ProviderAdapter>>,
    default: ProviderId,
}

impl ProviderRegistry {
    /// Registry whose default is `default`; the default must be registered
    /// before use.
    pub fn new(default: ProviderId) -> Self {
        Self {
            providers: HashMap::new(),
            default,
        }
    }

    pub fn with_provider(mut self, provider: ProviderAdapter) -> Self {
        self.providers
            .insert(provider.id().clone(), Arc::new(provider));
        self
    }

    pub fn get(&self, id: &ProviderId) -> Option<Arc<ProviderAdapter>> {
        self.providers.get(id).cloned()
    }

    pub fn default_id(&self) -> &ProviderId {
        &self.default
    }

    pub fn ids(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.providers.keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gameplan_domain::{ResponseSource, SessionId, UserId};

    struct FixedTransport {
        kind: TransportKind,
        text: String,
    }

    #[async_trait]
    impl ProviderTransport for FixedTransport {
        fn kind(&self) -> TransportKind {
            self.kind
        }

        fn name(&self) -> &str {
            "fixed"
        }

        async fn initialize(
            &self,
            _request: &InitializeRequest,
        ) -> Result<ProviderSessionSeed, TransportError> {
            Ok(ProviderSessionSeed {
                session_id: Some(SessionId::new("remote-1")),
                greeting: self.text.clone(),
                raw: None,
            })
        }

        async fn send_message(
            &self,
            _request: &MessageRequest,
        ) -> Result<ProviderReply, TransportError> {
            Ok(ProviderReply::new(self.text.clone()))
        }
    }

    fn attempt(kind: TransportKind, text: &str) -> TransportAttempt {
        TransportAttempt::new(Arc::new(FixedTransport {
            kind,
            text: text.to_string(),
        }))
    }

    fn session() -> GameSession {
        let mut session = GameSession::new(
            SessionId::new("local-1"),
            UserId::new("u1"),
            Topic::new("intro-ai", "Intro to AI", "What AI is."),
            Difficulty::Hard,
            ProviderId::new("direct"),
        );
        session.begin("hello", ResponseSource::Primary, 3).unwrap();
        session
    }

    fn direct(attempts: Vec<TransportAttempt>) -> ProviderAdapter {
        ProviderAdapter::DirectApi(DirectApiProvider {
            id: ProviderId::new("direct"),
            attempts,
            temperature: 0.7,
            max_tokens: 512,
        })
    }

    #[test]
    fn rpc_requests_carry_no_chat_prompt() {
        let rpc = ProviderAdapter::Rpc(RpcProvider {
            id: ProviderId::new("rpc"),
            attempts: vec![],
        });
        let request = rpc.initialize_request(&session());
        assert!(request.chat.is_none());
        assert_eq!(request.difficulty, Difficulty::Hard);
    }

    #[test]
    fn direct_reply_prompt_ends_with_user_message() {
        let provider = direct(vec![]);
        let image = ConversationMessage::user("what is this?").with_attachment(Attachment::Image {
            uri: "https://cdn.example/x.png".to_string(),
        });
        let history = session().history().to_vec();
        let request = provider.message_request(&session(), image, history);

        let chat = request.chat.unwrap();
        assert_eq!(chat.messages.first().unwrap().role, Role::System);
        assert!(chat.messages[0].content.contains("Intro to AI"));
        let last = chat.messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert!(last.content.contains("[image: https://cdn.example/x.png]"));
        assert_eq!(chat.messages.len(), 3);
        assert_eq!(chat.max_tokens, 512);
    }

    #[tokio::test]
    async fn empty_reply_is_an_error_not_a_success() {
        let provider = direct(vec![attempt(TransportKind::ChatCompletions, "   ")]);
        let s = session();
        let request = provider.message_request(&s, ConversationMessage::user("hi"), vec![]);
        let err = provider
            .send_message(&provider.attempts()[0], &request)
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::MalformedResponse("empty reply".to_string()));
    }

    #[tokio::test]
    async fn direct_api_drops_session_ids() {
        let provider = direct(vec![attempt(TransportKind::ChatCompletions, "Welcome!")]);
        let request = provider.initialize_request(&session());
        let seed = provider
            .initialize(&provider.attempts()[0], &request)
            .await
            .unwrap();
        assert_eq!(seed.greeting, "Welcome!");
        assert!(seed.session_id.is_none());
    }

    #[tokio::test]
    async fn mismatched_transport_is_rejected() {
        let provider = direct(vec![attempt(TransportKind::CallableRpc, "hi")]);
        let request = provider.initialize_request(&session());
        let err = provider
            .initialize(&provider.attempts()[0], &request)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NotConfigured(_)));
    }

    #[test]
    fn registry_lookup_by_id() {
        let registry = ProviderRegistry::new(ProviderId::new("direct")).with_provider(direct(vec![]));
        assert!(registry.get(&ProviderId::new("direct")).is_some());
        assert!(registry.get(&ProviderId::new("rpc")).is_none());
        assert_eq!(registry.ids(), vec![ProviderId::new("direct")]);
    }
}
