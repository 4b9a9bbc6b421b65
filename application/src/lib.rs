//! Application layer for gameplan
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ChainParams, GameParams};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    identity::{FixedIdentity, IdentityPort},
    ledger_store::{LedgerStore, LedgerStoreError},
    provider_transport::{
        ChatMessage, ChatPrompt, InitializeRequest, MessageRequest, ProviderReply,
        ProviderSessionSeed, ProviderTransport, TransportError, TransportKind,
    },
    session_store::{SessionStore, SessionStoreError},
    topic_catalog::TopicCatalog,
};
pub use use_cases::credit_ledger::{CreditLedger, LedgerError};
pub use use_cases::error::GameError;
pub use use_cases::fallback_chain::{
    AllTransportsExhausted, ChainOutcome, TransportFailure, TransportFallbackChain,
};
pub use use_cases::game_orchestrator::GameOrchestrator;
pub use use_cases::provider_adapter::{
    DEFAULT_ATTEMPT_TIMEOUT, DirectApiProvider, ProviderAdapter, ProviderFamily, ProviderRegistry,
    RpcProvider, TransportAttempt,
};
pub use use_cases::session_manager::{MessageOutcome, SessionHandle, SessionManager, TopicChange};
pub use use_cases::turn_queue::{Ticket, Turn, TurnQueue};
