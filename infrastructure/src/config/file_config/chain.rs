//! Fallback chain configuration from TOML (`[chain]` section)

use crate::config::issue::{ConfigIssue, ConfigIssueCode};
use gameplan_application::ChainParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChainConfig {
    /// Seconds an attempt may take before the chain moves on (default: 30).
    /// Per-provider `timeout_secs` overrides it.
    pub attempt_timeout_secs: u64,
    /// Skip transports that already failed for the same provider.
    pub skip_tripped_transports: bool,
    /// Compare-and-swap attempts when committing a charge (default: 3).
    pub commit_attempts: u32,
}

impl Default for FileChainConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_secs: 30,
            skip_tripped_transports: true,
            commit_attempts: 3,
        }
    }
}

impl FileChainConfig {
    pub fn attempt_timeout(&self) -> (Duration, Vec<ConfigIssue>) {
        if self.attempt_timeout_secs == 0 {
            let fallback = Self::default().attempt_timeout_secs;
            return (
                Duration::from_secs(fallback),
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidValue {
                        field: "chain.attempt_timeout_secs".to_string(),
                    },
                    format!(
                        "chain.attempt_timeout_secs must be positive, using {}",
                        fallback
                    ),
                )],
            );
        }
        (Duration::from_secs(self.attempt_timeout_secs), vec![])
    }

    pub fn parse_commit_attempts(&self) -> (u32, Vec<ConfigIssue>) {
        if self.commit_attempts == 0 {
            return (
                1,
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidValue {
                        field: "chain.commit_attempts".to_string(),
                    },
                    "chain.commit_attempts must be at least 1, using 1",
                )],
            );
        }
        (self.commit_attempts, vec![])
    }

    pub fn to_chain_params(&self) -> ChainParams {
        ChainParams {
            skip_tripped_transports: self.skip_tripped_transports,
        }
    }
}
