//! Callable RPC transport.
//!
//! Same payloads as the HTTP endpoint, wrapped in the callable protocol:
//! the request body is `{"data": payload}` and the response is either
//! `{"result": value}` or `{"error": {"status": ..., "message": ...}}`.

use super::http_endpoint::ServiceEndpoints;
use super::payload::{
    connection_error, initialize_payload, join_url, message_payload, parse_reply, parse_seed,
    read_json,
};
use async_trait::async_trait;
use gameplan_application::{
    InitializeRequest, MessageRequest, ProviderReply, ProviderSessionSeed, ProviderTransport,
    TransportError, TransportKind,
};
use serde_json::{Value, json};
use tracing::debug;

pub struct CallableRpcTransport {
    client: reqwest::Client,
    endpoints: ServiceEndpoints,
    name: String,
}

impl CallableRpcTransport {
    pub fn new(client: reqwest::Client, endpoints: ServiceEndpoints) -> Self {
        let name = format!("callable:{}", endpoints.base_url);
        Self {
            client,
            endpoints,
            name,
        }
    }

    async fn call(&self, function: &str, payload: Value) -> Result<Value, TransportError> {
        let url = join_url(&self.endpoints.base_url, function);
        debug!("CALL {}", url);
        let mut request = self.client.post(&url).json(&json!({ "data": payload }));
        if let Some(token) = &self.endpoints.bearer_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(connection_error)?;
        unwrap_result(read_json(response).await?)
    }
}

/// Extract `result` from a callable response envelope.
fn unwrap_result(mut envelope: Value) -> Result<Value, TransportError> {
    if let Some(error) = envelope.get("error") {
        let code = error
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN")
            .to_string();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("callable returned an error")
            .to_string();
        return Err(TransportError::Remote { code, message });
    }
    match envelope.get_mut("result").map(Value::take) {
        Some(Value::Null) | None => Err(TransportError::MalformedResponse(
            "callable response has no result".to_string(),
        )),
        Some(result) => Ok(result),
    }
}

#[async_trait]
impl ProviderTransport for CallableRpcTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::CallableRpc
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(
        &self,
        request: &InitializeRequest,
    ) -> Result<ProviderSessionSeed, TransportError> {
        let value = self
            .call(&self.endpoints.initialize, initialize_payload(request))
            .await?;
        parse_seed(value)
    }

    async fn send_message(
        &self,
        request: &MessageRequest,
    ) -> Result<ProviderReply, TransportError> {
        let value = self
            .call(&self.endpoints.send_message, message_payload(request))
            .await?;
        parse_reply(value)
    }
}
