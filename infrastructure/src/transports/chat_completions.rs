//! Chat-completions API transport (`POST {base}/v1/chat/completions`).
//!
//! Only understands requests that carry a [`ChatPrompt`]; the provider
//! adapter builds it.

use super::payload::{connection_error, join_url, read_json};
use async_trait::async_trait;
use gameplan_application::{
    ChatPrompt, InitializeRequest, MessageRequest, ProviderReply, ProviderSessionSeed,
    ProviderTransport, TransportError, TransportKind,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ChatCompletionsSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct ChatCompletionsTransport {
    client: reqwest::Client,
    settings: ChatCompletionsSettings,
    name: String,
}

impl ChatCompletionsTransport {
    pub fn new(client: reqwest::Client, settings: ChatCompletionsSettings) -> Self {
        let name = format!("chat:{}", settings.model);
        Self {
            client,
            settings,
            name,
        }
    }

    async fn complete(&self, prompt: Option<&ChatPrompt>) -> Result<(String, Value), TransportError> {
        let prompt = prompt.ok_or_else(|| {
            TransportError::NotConfigured("request carries no chat prompt".to_string())
        })?;
        let api_key = self.settings.api_key.as_deref().ok_or_else(|| {
            TransportError::NotConfigured("no API key for chat completions".to_string())
        })?;

        let body = request_body(&self.settings.model, prompt);
        let url = join_url(&self.settings.base_url, "v1/chat/completions");
        debug!(
            "POST {} ({} messages, model {})",
            url,
            prompt.messages.len(),
            self.settings.model
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;
        let value = read_json(response).await?;
        let text = extract_content(&value)?;
        Ok((text, value))
    }
}

fn request_body<'a>(model: &'a str, prompt: &'a ChatPrompt) -> CompletionRequest<'a> {
    CompletionRequest {
        model,
        messages: prompt
            .messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
        temperature: prompt.temperature,
        max_tokens: prompt.max_tokens,
    }
}

/// `choices[0].message.content`
fn extract_content(value: &Value) -> Result<String, TransportError> {
    let response: CompletionResponse = serde_json::from_value(value.clone())
        .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| TransportError::MalformedResponse("no completion content".to_string()))
}

#[async_trait]
impl ProviderTransport for ChatCompletionsTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::ChatCompletions
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(
        &self,
        request: &InitializeRequest,
    ) -> Result<ProviderSessionSeed, TransportError> {
        let (greeting, raw) = self.complete(request.chat.as_ref()).await?;
        Ok(ProviderSessionSeed {
            session_id: None,
            greeting,
            raw: Some(raw),
        })
    }

    async fn send_message(
        &self,
        request: &MessageRequest,
    ) -> Result<ProviderReply, TransportError> {
        let (text, raw) = self.complete(request.chat.as_ref()).await?;
        Ok(ProviderReply {
            text,
            raw: Some(raw),
        })
    }
}
