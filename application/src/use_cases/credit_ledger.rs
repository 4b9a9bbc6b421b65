//! Credit ledger use case.
//!
//! Wraps a [`LedgerStore`] with reserve/commit semantics:
//!
//! 1. [`CreditLedger::try_reserve`] checks the balance and earmarks the
//!    amount, so a second operation racing the first sees the reduced
//!    available balance. Nothing is written on failure.
//! 2. The caller performs the (slow, possibly failing) remote work.
//! 3. [`CreditLedger::commit`] debits the store with a compare-and-swap
//!    guarded by the balance it just read. Committing the same reservation
//!    twice debits once.
//!
//! Earmarks are process-local; the store's conditional write is what keeps
//! two devices from losing each other's debits.
//!
//! Reserve and commit for one user run one at a time behind a per-user
//! lock held across the store round-trip. Different users never wait on
//! each other; the shared bookkeeping is only locked briefly, never across
//! an await.

use crate::ports::ledger_store::{LedgerStore, LedgerStoreError};
use gameplan_domain::{CreditAccount, OperationKind, Reservation, ReservationId, UserId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

/// How many committed reservation ids are remembered for idempotency.
const COMMITTED_MEMORY: usize = 4096;

/// Errors from ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("No credit account for user {0}")]
    AccountNotFound(UserId),

    /// `balance` is what the operation could have spent. From
    /// [`CreditLedger::try_reserve`] that is the *available* balance (balance
    /// of record minus outstanding earmarks), so it can be lower than
    /// [`CreditLedger::get_balance`]. From [`CreditLedger::commit`] it is
    /// the balance of record read from the store.
    #[error("Insufficient credits: balance {balance}, required {required}")]
    InsufficientCredits { balance: u64, required: u64 },

    #[error("Reservation {0} is unknown or was released")]
    UnknownReservation(ReservationId),

    #[error("Balance for {user_id} kept changing; gave up after {attempts} attempts")]
    Contention { user_id: UserId, attempts: u32 },

    #[error("Ledger store error: {0}")]
    Store(#[from] LedgerStoreError),
}

#[derive(Default)]
struct LedgerState {
    pending: HashMap<ReservationId, Reservation>,
    earmarked: HashMap<UserId, u64>,
    committed: HashSet<ReservationId>,
    committed_order: VecDeque<ReservationId>,
}

impl LedgerState {
    fn earmarked_for(&self, user_id: &UserId) -> u64 {
        self.earmarked.get(user_id).copied().unwrap_or(0)
    }

    fn settle(&mut self, reservation: &Reservation) -> bool {
        if self.pending.remove(&reservation.id()).is_none() {
            return false;
        }
        if let Some(total) = self.earmarked.get_mut(reservation.user_id()) {
            *total = total.saturating_sub(reservation.amount());
            if *total == 0 {
                self.earmarked.remove(reservation.user_id());
            }
        }
        true
    }

    fn remember_commit(&mut self, id: ReservationId) {
        self.committed.insert(id);
        self.committed_order.push_back(id);
        while self.committed_order.len() > COMMITTED_MEMORY {
            if let Some(old) = self.committed_order.pop_front() {
                self.committed.remove(&old);
            }
        }
    }
}

/// Per-user credit ledger with reserve/commit semantics.
pub struct CreditLedger {
    store: Arc<dyn LedgerStore>,
    seed_balance: u64,
    commit_attempts: u32,
    state: Mutex<LedgerState>,
    user_locks: Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
    next_id: AtomicU64,
}

impl CreditLedger {
    pub fn new(store: Arc<dyn LedgerStore>, seed_balance: u64) -> Self {
        Self {
            store,
            seed_balance,
            commit_attempts: 3,
            state: Mutex::new(LedgerState::default()),
            user_locks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_commit_attempts(mut self, attempts: u32) -> Self {
        self.commit_attempts = attempts.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock serializing reserve and commit for one user.
    fn user_lock(&self, user_id: &UserId) -> Arc<AsyncMutex<()>> {
        self.user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(user_id.clone())
            .or_default()
            .clone()
    }

    /// Create the user's account with the seed balance unless it exists.
    ///
    /// Returns the balance of record.
    pub async fn open_account(&self, user_id: &UserId) -> Result<u64, LedgerError> {
        let account = self
            .store
            .create_if_absent(CreditAccount::new(user_id.clone(), self.seed_balance))
            .await?;
        debug!("Account {} open with balance {}", user_id, account.balance);
        Ok(account.balance)
    }

    /// Balance of record. Never creates an account.
    pub async fn get_balance(&self, user_id: &UserId) -> Result<u64, LedgerError> {
        self.store
            .get(user_id)
            .await?
            .map(|account| account.balance)
            .ok_or_else(|| LedgerError::AccountNotFound(user_id.clone()))
    }

    /// Balance minus credits earmarked by outstanding reservations.
    pub async fn available_balance(&self, user_id: &UserId) -> Result<u64, LedgerError> {
        let user_lock = self.user_lock(user_id);
        let _user = user_lock.lock().await;
        let balance = self.get_balance(user_id).await?;
        Ok(balance.saturating_sub(self.state().earmarked_for(user_id)))
    }

    /// Earmark `amount` credits for one operation.
    ///
    /// Fails with `InsufficientCredits` (reporting the available balance)
    /// without touching any state when `amount` exceeds what is available.
    pub async fn try_reserve(
        &self,
        user_id: &UserId,
        kind: OperationKind,
        amount: u64,
    ) -> Result<Reservation, LedgerError> {
        let user_lock = self.user_lock(user_id);
        let _user = user_lock.lock().await;
        let balance = self.get_balance(user_id).await?;

        let mut state = self.state();
        let available = balance.saturating_sub(state.earmarked_for(user_id));
        if amount > available {
            debug!(
                "Reservation refused for {}: {} required, {} available",
                user_id, amount, available
            );
            return Err(LedgerError::InsufficientCredits {
                balance: available,
                required: amount,
            });
        }

        let id = ReservationId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let reservation = Reservation::new(id, user_id.clone(), kind, amount);
        state.pending.insert(id, reservation.clone());
        *state.earmarked.entry(user_id.clone()).or_insert(0) += amount;
        debug!("Reserved {} credits for {} ({}, {})", amount, user_id, kind, id);
        Ok(reservation)
    }

    /// Debit the reserved amount. Idempotent per reservation.
    ///
    /// Returns the balance after the debit (or the current balance when the
    /// reservation was already committed). On failure the reservation stays
    /// pending so the caller can release it.
    pub async fn commit(&self, reservation: &Reservation) -> Result<u64, LedgerError> {
        let user_id = reservation.user_id();
        let user_lock = self.user_lock(user_id);
        let _user = user_lock.lock().await;

        let (committed, pending) = {
            let state = self.state();
            (
                state.committed.contains(&reservation.id()),
                state.pending.contains_key(&reservation.id()),
            )
        };
        if committed {
            debug!("Reservation {} already committed", reservation.id());
            return self.get_balance(user_id).await;
        }
        if !pending {
            return Err(LedgerError::UnknownReservation(reservation.id()));
        }

        for attempt in 1..=self.commit_attempts {
            let account = self
                .store
                .get(user_id)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(user_id.clone()))?;
            let Some(new_balance) = account.debit(reservation.amount()) else {
                return Err(LedgerError::InsufficientCredits {
                    balance: account.balance,
                    required: reservation.amount(),
                });
            };

            if self
                .store
                .compare_and_swap(user_id, account.balance, new_balance)
                .await?
            {
                {
                    let mut state = self.state();
                    state.settle(reservation);
                    state.remember_commit(reservation.id());
                }
                info!(
                    "Committed {} credits for {} ({}): balance {} -> {}",
                    reservation.amount(),
                    user_id,
                    reservation.kind(),
                    account.balance,
                    new_balance
                );
                return Ok(new_balance);
            }
            warn!(
                "Balance for {} changed during commit (attempt {}/{})",
                user_id, attempt, self.commit_attempts
            );
        }

        Err(LedgerError::Contention {
            user_id: user_id.clone(),
            attempts: self.commit_attempts,
        })
    }

    /// Drop the earmark without debiting. Returns `false` if the reservation
    /// was not pending (already committed or released).
    pub async fn release(&self, reservation: &Reservation) -> bool {
        let released = self.state().settle(reservation);
        if released {
            debug!(
                "Released {} credits for {} ({})",
                reservation.amount(),
                reservation.user_id(),
                reservation.id()
            );
        }
        released
    }
}
