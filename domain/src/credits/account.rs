//! User identity and credit account entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque user identifier owned by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's credit account (Entity)
///
/// `balance` is unsigned, so the "never negative" invariant is carried by the
/// type; every debit goes through [`CreditAccount::debit`], which refuses to
/// underflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditAccount {
    pub user_id: UserId,
    pub balance: u64,
    /// Written by the external refill job; read-only here.
    #[serde(default)]
    pub last_refill: Option<DateTime<Utc>>,
}

impl CreditAccount {
    pub fn new(user_id: UserId, balance: u64) -> Self {
        Self {
            user_id,
            balance,
            last_refill: None,
        }
    }

    /// Balance after subtracting `amount`, or `None` if it would go negative.
    pub fn debit(&self, amount: u64) -> Option<u64> {
        self.balance.checked_sub(amount)
    }
}
