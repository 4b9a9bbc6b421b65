//! Game parameters: use case behavior knobs.
//!
//! These are application-layer concerns, not domain policy. Pricing itself
//! is domain data ([`CostTable`]) and is carried here only so the wiring
//! layer has one value to pass around.

use gameplan_domain::CostTable;

/// Parameters shared by the session use cases.
#[derive(Debug, Clone)]
pub struct GameParams {
    /// Price of each operation kind.
    pub costs: CostTable,
    /// Balance given to an account when it is first opened.
    pub seed_balance: u64,
    /// Number of trailing history messages forwarded to providers.
    pub history_window: usize,
    /// Compare-and-swap attempts before a commit gives up on contention.
    pub commit_attempts: u32,
    pub chain: ChainParams,
}

impl Default for GameParams {
    fn default() -> Self {
        Self {
            costs: CostTable::default(),
            seed_balance: 20,
            history_window: 20,
            commit_attempts: 3,
            chain: ChainParams::default(),
        }
    }
}

impl GameParams {
    // ==================== Builder Methods ====================

    pub fn with_costs(mut self, costs: CostTable) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_seed_balance(mut self, balance: u64) -> Self {
        self.seed_balance = balance;
        self
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window.max(1);
        self
    }

    pub fn with_chain(mut self, chain: ChainParams) -> Self {
        self.chain = chain;
        self
    }
}

/// Transport fallback chain behavior.
#[derive(Debug, Clone)]
pub struct ChainParams {
    /// Skip attempts that already failed in this process for the same
    /// provider. When every attempt of a provider has failed, the full plan
    /// runs again.
    pub skip_tripped_transports: bool,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            skip_tripped_transports: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_window_is_at_least_one() {
        let params = GameParams::default().with_history_window(0);
        assert_eq!(params.history_window, 1);
    }

    #[test]
    fn defaults() {
        let params = GameParams::default();
        assert_eq!(params.history_window, 20);
        assert_eq!(params.commit_attempts, 3);
        assert!(params.chain.skip_tripped_transports);
    }
}
