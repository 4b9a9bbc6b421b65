//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod conversation_logger;
pub mod identity;
pub mod ledger_store;
pub mod provider_transport;
pub mod session_store;
pub mod topic_catalog;
