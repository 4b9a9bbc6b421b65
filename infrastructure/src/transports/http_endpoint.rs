//! Plain HTTP POST/JSON transport to the game service.

use super::payload::{
    connection_error, initialize_payload, join_url, message_payload, parse_reply, parse_seed,
    read_json,
};
use async_trait::async_trait;
use gameplan_application::{
    InitializeRequest, MessageRequest, ProviderReply, ProviderSessionSeed, ProviderTransport,
    TransportError, TransportKind,
};
use serde_json::Value;
use tracing::debug;

/// Where a game-service function lives.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub base_url: String,
    pub initialize: String,
    pub send_message: String,
    /// Sent as `Authorization: Bearer ...` when present.
    pub bearer_token: Option<String>,
}

pub struct HttpEndpointTransport {
    client: reqwest::Client,
    endpoints: ServiceEndpoints,
    name: String,
}

impl HttpEndpointTransport {
    pub fn new(client: reqwest::Client, endpoints: ServiceEndpoints) -> Self {
        let name = format!("http:{}", endpoints.base_url);
        Self {
            client,
            endpoints,
            name,
        }
    }

    async fn post(&self, function: &str, body: &Value) -> Result<Value, TransportError> {
        let url = join_url(&self.endpoints.base_url, function);
        debug!("POST {}", url);
        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.endpoints.bearer_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(connection_error)?;
        read_json(response).await
    }
}

#[async_trait]
impl ProviderTransport for HttpEndpointTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::HttpEndpoint
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(
        &self,
        request: &InitializeRequest,
    ) -> Result<ProviderSessionSeed, TransportError> {
        let body = initialize_payload(request);
        let value = self.post(&self.endpoints.initialize, &body).await?;
        parse_seed(value)
    }

    async fn send_message(
        &self,
        request: &MessageRequest,
    ) -> Result<ProviderReply, TransportError> {
        let body = message_payload(request);
        let value = self.post(&self.endpoints.send_message, &body).await?;
        parse_reply(value)
    }
}
