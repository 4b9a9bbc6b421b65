//! Credit reservation value object

use super::account::UserId;
use super::cost::OperationKind;
use serde::{Deserialize, Serialize};

/// Identifier of a single reservation, unique within a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(u64);

impl ReservationId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rsv-{}", self.0)
    }
}

/// Credits earmarked for one logical operation.
///
/// Issued by the ledger when a balance check passes; settled exactly once by
/// commit (debit) or release (drop the earmark).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    id: ReservationId,
    user_id: UserId,
    kind: OperationKind,
    amount: u64,
}

impl Reservation {
    pub fn new(id: ReservationId, user_id: UserId, kind: OperationKind, amount: u64) -> Self {
        Self {
            id,
            user_id,
            kind,
            amount,
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}
