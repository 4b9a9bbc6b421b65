//! Ledger store port
//!
//! A document per user holding an integer `credits` field. The credit ledger
//! wraps read-modify-write semantics around it; stores only need a plain read
//! and a conditional write.

use async_trait::async_trait;
use gameplan_domain::{CreditAccount, UserId};
use thiserror::Error;

/// Errors raised by a ledger store backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerStoreError {
    #[error("Ledger store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt ledger record for {user_id}: {message}")]
    Corrupt { user_id: String, message: String },
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Read the account, `None` if the user has no record.
    async fn get(&self, user_id: &UserId) -> Result<Option<CreditAccount>, LedgerStoreError>;

    /// Insert `account` unless a record already exists; returns the stored record.
    async fn create_if_absent(
        &self,
        account: CreditAccount,
    ) -> Result<CreditAccount, LedgerStoreError>;

    /// Set the balance to `new` only if it currently equals `expected`.
    ///
    /// Returns `false` when the guard did not hold (someone else wrote first)
    /// or the record is gone.
    async fn compare_and_swap(
        &self,
        user_id: &UserId,
        expected: u64,
        new: u64,
    ) -> Result<bool, LedgerStoreError>;
}
