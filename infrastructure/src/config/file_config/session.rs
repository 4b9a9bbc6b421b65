//! Session configuration from TOML (`[session]` section)

use crate::config::issue::{ConfigIssue, ConfigIssueCode, Severity};
use gameplan_domain::Difficulty;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Trailing history messages forwarded to providers (default: 20).
    pub history_window: usize,
    /// Difficulty used when a command does not name one.
    pub default_difficulty: String,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            history_window: 20,
            default_difficulty: "easy".to_string(),
        }
    }
}

impl FileSessionConfig {
    pub fn parse_difficulty(&self) -> (Difficulty, Vec<ConfigIssue>) {
        match self.default_difficulty.parse::<Difficulty>() {
            Ok(difficulty) => (difficulty, vec![]),
            Err(_) => (
                Difficulty::Easy,
                vec![ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: "session.default_difficulty".to_string(),
                        value: self.default_difficulty.clone(),
                        valid_values: vec![
                            "easy".to_string(),
                            "intermediate".to_string(),
                            "hard".to_string(),
                        ],
                    },
                    message: format!(
                        "session.default_difficulty: unknown value '{}', falling back to 'easy'",
                        self.default_difficulty
                    ),
                }],
            ),
        }
    }

    pub fn parse_history_window(&self) -> (usize, Vec<ConfigIssue>) {
        if self.history_window == 0 {
            return (
                1,
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidValue {
                        field: "session.history_window".to_string(),
                    },
                    "session.history_window must be at least 1, using 1",
                )],
            );
        }
        (self.history_window, vec![])
    }
}
