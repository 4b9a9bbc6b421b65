//! Credit configuration from TOML (`[credits]` section)

use crate::config::issue::{ConfigIssue, ConfigIssueCode};
use gameplan_domain::{CostTable, OperationKind};
use serde::{Deserialize, Serialize};

/// Raw credit configuration
///
/// # Example
///
/// ```toml
/// [credits]
/// seed_balance = 20
///
/// [credits.costs]
/// initialize = 3
/// text_message = 1
/// image_message = 3
/// audio_message = 2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCreditsConfig {
    /// Balance given to an account when it is first opened.
    pub seed_balance: u64,
    pub costs: FileCostsConfig,
}

impl Default for FileCreditsConfig {
    fn default() -> Self {
        Self {
            seed_balance: 20,
            costs: FileCostsConfig::default(),
        }
    }
}

/// Price per operation kind (`[credits.costs]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCostsConfig {
    pub initialize: u64,
    pub text_message: u64,
    pub image_message: u64,
    pub audio_message: u64,
}

impl Default for FileCostsConfig {
    fn default() -> Self {
        let table = CostTable::default();
        Self {
            initialize: table.cost(OperationKind::Initialize),
            text_message: table.cost(OperationKind::TextMessage),
            image_message: table.cost(OperationKind::ImageMessage),
            audio_message: table.cost(OperationKind::AudioMessage),
        }
    }
}

impl FileCreditsConfig {
    /// Build the cost table, falling back to defaults when a cost is zero.
    pub fn parse_costs(&self) -> (CostTable, Vec<ConfigIssue>) {
        let c = &self.costs;
        match CostTable::new(c.initialize, c.text_message, c.image_message, c.audio_message) {
            Ok(table) => (table, vec![]),
            Err(e) => (
                CostTable::default(),
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidValue {
                        field: "credits.costs".to_string(),
                    },
                    format!("credits.costs: {}", e),
                )],
            ),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let (costs, mut issues) = self.parse_costs();
        let initialize = costs.cost(OperationKind::Initialize);
        if self.seed_balance < initialize {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidValue {
                    field: "credits.seed_balance".to_string(),
                },
                format!(
                    "credits.seed_balance ({}) is below the cost of starting a session ({}); new players cannot play",
                    self.seed_balance, initialize
                ),
            ));
        }
        issues
    }
}
