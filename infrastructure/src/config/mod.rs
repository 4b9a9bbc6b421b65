//! Configuration file loading for gameplan
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `GAMEPLAN_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./gameplan.toml` or `./.gameplan.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/gameplan/config.toml`
//! 5. Default values

mod file_config;
mod issue;
mod loader;

pub use file_config::{
    FileChainConfig, FileConfig, FileCostsConfig, FileCreditsConfig, FileDirectApiConfig,
    FileLoggingConfig, FileProvidersConfig, FileRpcConfig, FileSessionConfig, FileStorageConfig,
    FileTopicConfig, PROVIDER_NAMES, parse_topics,
};
pub use issue::{ConfigIssue, ConfigIssueCode, Severity};
pub use loader::{ConfigLoader, ENV_PREFIX};
