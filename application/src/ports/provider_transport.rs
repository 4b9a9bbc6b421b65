//! Provider transport port
//!
//! A transport is one concrete mechanism for reaching a provider (HTTP
//! endpoint, callable RPC, chat-completions API). Transports translate the
//! requests below into their wire format and back; they never retry or fall
//! back on their own.

use async_trait::async_trait;
use gameplan_domain::{ConversationMessage, Difficulty, Role, SessionId, Topic, UserId};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a single transport attempt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Remote call failed ({code}): {message}")]
    Remote { code: String, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("Transport not configured: {0}")]
    NotConfigured(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// Wire mechanism of a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Plain HTTP POST/JSON endpoint
    HttpEndpoint,
    /// Callable RPC (`{data}` in, `{result}` out)
    CallableRpc,
    /// Third-party chat-completions API
    ChatCompletions,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::HttpEndpoint => "http-endpoint",
            TransportKind::CallableRpc => "callable-rpc",
            TransportKind::ChatCompletions => "chat-completions",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One message in a chat-completions prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Fully shaped prompt for chat-completions style transports.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Request to open a provider-side session.
#[derive(Debug, Clone, PartialEq)]
pub struct InitializeRequest {
    pub user_id: UserId,
    /// Locally generated id; providers may answer with their own.
    pub session_id: SessionId,
    pub topic: Topic,
    pub difficulty: Difficulty,
    /// Present only for providers that speak chat-completions.
    pub chat: Option<ChatPrompt>,
}

/// Request for a reply to one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRequest {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub message: ConversationMessage,
    /// Tail of the conversation before `message`.
    pub history: Vec<ConversationMessage>,
    /// Present only for providers that speak chat-completions.
    pub chat: Option<ChatPrompt>,
}

/// What a provider returns when a session is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSessionSeed {
    /// Remotely assigned session id, if the provider issues one.
    pub session_id: Option<SessionId>,
    pub greeting: String,
    pub raw: Option<Value>,
}

impl ProviderSessionSeed {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            session_id: None,
            greeting: greeting.into(),
            raw: None,
        }
    }
}

/// What a provider returns for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub text: String,
    pub raw: Option<Value>,
}

impl ProviderReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raw: None,
        }
    }
}

/// A mechanism for reaching a provider.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Human-readable label used in logs and failure reports.
    fn name(&self) -> &str;

    async fn initialize(
        &self,
        request: &InitializeRequest,
    ) -> Result<ProviderSessionSeed, TransportError>;

    async fn send_message(&self, request: &MessageRequest)
    -> Result<ProviderReply, TransportError>;
}
