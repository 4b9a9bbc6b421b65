//! Request/response shapes shared by the game-service transports.
//!
//! The HTTP endpoint and the callable RPC speak the same payloads; the
//! callable wraps them in `{"data": ...}` / `{"result": ...}`.

use gameplan_application::{
    InitializeRequest, MessageRequest, ProviderReply, ProviderSessionSeed, TransportError,
};
use gameplan_domain::util::truncate_str;
use gameplan_domain::{Attachment, ConversationMessage, SessionId};
use serde_json::{Value, json};

/// Longest error body kept in a transport error.
const MAX_ERROR_BODY: usize = 512;

fn wire_message(message: &ConversationMessage) -> Value {
    let mut value = json!({
        "role": message.role.as_str(),
        "content": message.content,
    });
    if let Some(attachment) = &message.attachment {
        let kind = match attachment {
            Attachment::Image { .. } => "image",
            Attachment::Audio { .. } => "audio",
        };
        value["attachment"] = json!({ "kind": kind, "uri": attachment.uri() });
    }
    value
}

pub fn initialize_payload(request: &InitializeRequest) -> Value {
    json!({
        "userId": request.user_id.as_str(),
        "sessionId": request.session_id.as_str(),
        "topicId": request.topic.id.as_str(),
        "topic": request.topic.name,
        "difficulty": request.difficulty.as_str(),
    })
}

pub fn message_payload(request: &MessageRequest) -> Value {
    json!({
        "userId": request.user_id.as_str(),
        "sessionId": request.session_id.as_str(),
        "topicId": request.topic.id.as_str(),
        "topic": request.topic.name,
        "difficulty": request.difficulty.as_str(),
        "message": wire_message(&request.message),
        "conversationHistory": request.history.iter().map(wire_message).collect::<Vec<_>>(),
    })
}

fn non_empty_str<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// `{sessionId, initialPrompt, conversationHistory}` -> seed.
pub fn parse_seed(value: Value) -> Result<ProviderSessionSeed, TransportError> {
    let greeting = non_empty_str(&value, "initialPrompt")
        .ok_or_else(|| TransportError::MalformedResponse("missing initialPrompt".to_string()))?
        .to_string();
    let session_id = non_empty_str(&value, "sessionId").map(SessionId::new);
    Ok(ProviderSessionSeed {
        session_id,
        greeting,
        raw: Some(value),
    })
}

/// `{aiResponse}` -> reply.
pub fn parse_reply(value: Value) -> Result<ProviderReply, TransportError> {
    let text = non_empty_str(&value, "aiResponse")
        .ok_or_else(|| TransportError::MalformedResponse("missing aiResponse".to_string()))?
        .to_string();
    Ok(ProviderReply {
        text,
        raw: Some(value),
    })
}

pub fn connection_error(error: reqwest::Error) -> TransportError {
    TransportError::ConnectionError(error.to_string())
}

/// Read a JSON body, mapping non-2xx statuses to `TransportError::Http`.
pub async fn read_json(response: reqwest::Response) -> Result<Value, TransportError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let mut message = truncate_str(body.trim(), MAX_ERROR_BODY).to_string();
        if message.is_empty() {
            message = status.canonical_reason().unwrap_or("Unknown").to_string();
        }
        return Err(TransportError::Http {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| TransportError::MalformedResponse(e.to_string()))
}

/// Join a base URL and a path segment with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gameplan_domain::{Difficulty, Topic, UserId};

    fn message_request() -> MessageRequest {
        MessageRequest {
            user_id: UserId::new("u1"),
            session_id: SessionId::new("s1"),
            topic: Topic::new("intro-ai", "Intro to AI", ""),
            difficulty: Difficulty::Intermediate,
            message: ConversationMessage::user("what is this?").with_attachment(
                Attachment::Image {
                    uri: "https://cdn.example/cat.png".to_string(),
                },
            ),
            history: vec![ConversationMessage::system("Difficulty changed")],
            chat: None,
        }
    }

    #[test]
    fn message_payload_carries_history_and_attachment() {
        let payload = message_payload(&message_request());
        assert_eq!(payload["sessionId"], "s1");
        assert_eq!(payload["difficulty"], "intermediate");
        assert_eq!(payload["message"]["content"], "what is this?");
        assert_eq!(payload["message"]["attachment"]["kind"], "image");
        assert_eq!(payload["conversationHistory"][0]["role"], "system");
    }

    #[test]
    fn seed_requires_initial_prompt() {
        let seed = parse_seed(json!({
            "sessionId": "remote-1",
            "initialPrompt": "Welcome!",
            "conversationHistory": [],
        }))
        .unwrap();
        assert_eq!(seed.greeting, "Welcome!");
        assert_eq!(seed.session_id, Some(SessionId::new("remote-1")));

        let err = parse_seed(json!({ "sessionId": "remote-1" })).unwrap_err();
        assert!(matches!(err, TransportError::MalformedResponse(_)));
    }

    #[test]
    fn blank_reply_is_malformed() {
        assert!(parse_reply(json!({ "aiResponse": "  " })).is_err());
        assert_eq!(
            parse_reply(json!({ "aiResponse": "Sure." })).unwrap().text,
            "Sure."
        );
    }

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(
            join_url("https://api.example/", "/initializeGameSession"),
            "https://api.example/initializeGameSession"
        );
    }
}
