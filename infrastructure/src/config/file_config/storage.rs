//! Storage and logging configuration from TOML (`[storage]`, `[logging]`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Root of the ledger file and the sessions directory.
    /// Defaults to the platform data directory (`~/.local/share/gameplan`).
    pub data_dir: Option<PathBuf>,
}

impl FileStorageConfig {
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("gameplan")
        })
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.resolve_data_dir().join("credits.json")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.resolve_data_dir().join("sessions")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL conversation transcript. Disabled when unset.
    pub transcript: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_data_dir() {
        let config = FileStorageConfig {
            data_dir: Some(PathBuf::from("/tmp/gp")),
        };
        assert_eq!(config.ledger_path(), PathBuf::from("/tmp/gp/credits.json"));
        assert_eq!(config.sessions_dir(), PathBuf::from("/tmp/gp/sessions"));
    }
}
