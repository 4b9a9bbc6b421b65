//! Provider transports: concrete ways of reaching a provider.
//!
//! - [`HttpEndpointTransport`]: plain HTTP POST/JSON to the game service
//! - [`CallableRpcTransport`]: the same service through the callable protocol
//! - [`ChatCompletionsTransport`]: a third-party chat-completions API

mod callable_rpc;
mod chat_completions;
mod http_endpoint;
mod payload;

pub use callable_rpc::CallableRpcTransport;
pub use chat_completions::{ChatCompletionsSettings, ChatCompletionsTransport};
pub use http_endpoint::{HttpEndpointTransport, ServiceEndpoints};
