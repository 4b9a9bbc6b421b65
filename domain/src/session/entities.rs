//! Conversation message entities

use super::response::ResponseSource;
use crate::credits::cost::OperationKind;
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Media attached to a user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Attachment {
    Image { uri: String },
    Audio { uri: String },
}

impl Attachment {
    pub fn uri(&self) -> &str {
        match self {
            Attachment::Image { uri } | Attachment::Audio { uri } => uri,
        }
    }
}

/// A message in a conversation (Entity)
///
/// Messages are append-only once they enter a session's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Set on assistant replies only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ResponseSource>,
}

impl ConversationMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachment: None,
            source: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>, source: ResponseSource) -> Self {
        Self {
            source: Some(source),
            ..Self::new(Role::Assistant, content)
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Whether this is an assistant reply produced locally.
    pub fn is_synthetic(&self) -> bool {
        self.source == Some(ResponseSource::Synthetic)
    }
}

/// What a caller says in one `send message` operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageInput {
    Text(String),
    Image { prompt: String, uri: String },
    Audio { transcript: String, uri: String },
}

impl MessageInput {
    pub fn text(content: impl Into<String>) -> Self {
        MessageInput::Text(content.into())
    }

    /// Operation kind used to price this input.
    pub fn kind(&self) -> OperationKind {
        match self {
            MessageInput::Text(_) => OperationKind::TextMessage,
            MessageInput::Image { .. } => OperationKind::ImageMessage,
            MessageInput::Audio { .. } => OperationKind::AudioMessage,
        }
    }

    /// The textual part of the input.
    pub fn content(&self) -> &str {
        match self {
            MessageInput::Text(text) => text,
            MessageInput::Image { prompt, .. } => prompt,
            MessageInput::Audio { transcript, .. } => transcript,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content().trim().is_empty()
            && !matches!(self, MessageInput::Image { .. } | MessageInput::Audio { .. })
    }

    /// The user message this input appends to history.
    pub fn to_message(&self) -> ConversationMessage {
        let message = ConversationMessage::user(self.content());
        match self {
            MessageInput::Text(_) => message,
            MessageInput::Image { uri, .. } => {
                message.with_attachment(Attachment::Image { uri: uri.clone() })
            }
            MessageInput::Audio { uri, .. } => {
                message.with_attachment(Attachment::Audio { uri: uri.clone() })
            }
        }
    }
}
