//! Infrastructure layer for gameplan
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: provider transports, ledger and session
//! stores, the topic catalog, transcript logging and configuration loading.

pub mod bootstrap;
pub mod config;
pub mod content;
pub mod logging;
pub mod stores;
pub mod transports;

// Re-export commonly used types
pub use bootstrap::{
    BootstrapError, BootstrapOptions, StorageMode, build_orchestrator, build_provider_registry,
};
pub use config::{ConfigIssue, ConfigLoader, FileConfig, Severity};
pub use content::{StaticTopicCatalog, builtin_topics};
pub use logging::JsonlConversationLogger;
pub use stores::{
    InMemoryLedgerStore, InMemorySessionStore, JsonFileLedgerStore, JsonFileSessionStore,
};
pub use transports::{
    CallableRpcTransport, ChatCompletionsSettings, ChatCompletionsTransport,
    HttpEndpointTransport, ServiceEndpoints,
};
