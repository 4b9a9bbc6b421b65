//! Persistence adapters for the ledger and session ports.
//!
//! Each port has an in-memory implementation (tests, `--ephemeral` runs)
//! and a JSON-file implementation under the configured data directory.

mod ledger;
mod sessions;

pub use ledger::{InMemoryLedgerStore, JsonFileLedgerStore};
pub use sessions::{InMemorySessionStore, JsonFileSessionStore};
