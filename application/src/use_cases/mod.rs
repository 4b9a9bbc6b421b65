//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod credit_ledger;
pub mod error;
pub mod fallback_chain;
pub mod game_orchestrator;
pub mod provider_adapter;
pub mod session_manager;
pub mod turn_queue;

#[cfg(test)]
pub(crate) mod test_support;
