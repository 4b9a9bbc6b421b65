//! Raw TOML configuration data types
//!
//! These structs mirror the config file exactly. `parse_*` helpers turn
//! them into domain/application values and report what they had to fix.

mod chain;
mod credits;
mod providers;
mod session;
mod storage;
mod topics;

pub use chain::FileChainConfig;
pub use credits::{FileCostsConfig, FileCreditsConfig};
pub use providers::{FileDirectApiConfig, FileProvidersConfig, FileRpcConfig, PROVIDER_NAMES};
pub use session::FileSessionConfig;
pub use storage::{FileLoggingConfig, FileStorageConfig};
pub use topics::{FileTopicConfig, parse_topics};

use super::issue::ConfigIssue;
use gameplan_application::GameParams;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Seed balance and operation prices
    pub credits: FileCreditsConfig,
    /// Transport fallback behavior
    pub chain: FileChainConfig,
    pub session: FileSessionConfig,
    pub providers: FileProvidersConfig,
    pub storage: FileStorageConfig,
    /// Catalog overrides
    pub topics: Vec<FileTopicConfig>,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.credits.validate());
        issues.extend(self.chain.attempt_timeout().1);
        issues.extend(self.chain.parse_commit_attempts().1);
        issues.extend(self.session.parse_history_window().1);
        issues.extend(self.session.parse_difficulty().1);
        issues.extend(self.providers.validate());
        issues.extend(parse_topics(&self.topics).1);

        issues
    }

    /// Application parameters. Invalid values fall back to defaults;
    /// [`validate`](Self::validate) reports them.
    pub fn to_game_params(&self) -> GameParams {
        let mut params = GameParams::default()
            .with_costs(self.credits.parse_costs().0)
            .with_seed_balance(self.credits.seed_balance)
            .with_history_window(self.session.parse_history_window().0)
            .with_chain(self.chain.to_chain_params());
        params.commit_attempts = self.chain.parse_commit_attempts().0;
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gameplan_domain::{Difficulty, OperationKind};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[credits]
seed_balance = 50

[credits.costs]
initialize = 5
text_message = 2

[chain]
attempt_timeout_secs = 10
skip_tripped_transports = false

[session]
history_window = 8
default_difficulty = "intermediate"

[providers]
default = "direct"

[providers.rpc]
endpoint_url = "https://game.example.com/api"
callable_url = "https://us-central1-demo.cloudfunctions.net"

[providers.direct]
model = "gpt-4o"
api_key = "sk-test"
max_tokens = 300

[storage]
data_dir = "/var/lib/gameplan"

[[topics]]
id = "robotics"
name = "Robotics"
description = "Sensors and actuators"

[logging]
transcript = "/tmp/gameplan.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.credits.seed_balance, 50);
        assert_eq!(config.credits.costs.image_message, 3);
        assert!(!config.chain.skip_tripped_transports);
        assert_eq!(
            config.session.parse_difficulty().0,
            Difficulty::Intermediate
        );
        assert_eq!(config.providers.default, "direct");
        assert_eq!(config.providers.direct.model, "gpt-4o");
        assert_eq!(
            config.providers.rpc.initialize_function,
            "initializeGameSession"
        );
        assert_eq!(config.topics.len(), 1);
        assert!(config.logging.transcript.is_some());
        assert!(config.validate().is_empty());

        let params = config.to_game_params();
        assert_eq!(params.seed_balance, 50);
        assert_eq!(params.history_window, 8);
        assert_eq!(params.costs.cost(OperationKind::Initialize), 5);
        assert_eq!(params.costs.cost(OperationKind::TextMessage), 2);
        assert!(!params.chain.skip_tripped_transports);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[session]\nhistory_window = 4\n").unwrap();
        assert_eq!(config.session.history_window, 4);
        assert_eq!(config.credits, FileCreditsConfig::default());
        assert_eq!(config.providers.default, "rpc");
        assert!(config.topics.is_empty());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config: FileConfig = toml::from_str(
            r#"
[credits.costs]
text_message = 0

[chain]
commit_attempts = 0
"#,
        )
        .unwrap();
        let params = config.to_game_params();
        assert_eq!(params.costs.cost(OperationKind::TextMessage), 1);
        assert_eq!(params.commit_attempts, 1);
        assert!(config.validate().iter().any(|i| i.is_error()));
    }
}
