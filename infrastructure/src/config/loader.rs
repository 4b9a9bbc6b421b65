//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["gameplan.toml", ".gameplan.toml"];

/// Prefix of environment overrides; `__` separates nested keys
/// (`GAMEPLAN_PROVIDERS__DIRECT__MODEL=gpt-4o`).
pub const ENV_PREFIX: &str = "GAMEPLAN_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `GAMEPLAN_*` environment variables
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./gameplan.toml` or `./.gameplan.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/gameplan/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        let project_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::figment(Self::global_config_path(), &project_dir, config_path)
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Build the merged figment from explicit locations.
    pub fn figment(
        global_path: Option<PathBuf>,
        project_dir: &Path,
        config_path: Option<&Path>,
    ) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = global_path.filter(|p| p.exists()) {
            figment = figment.merge(Toml::file(global_path));
        }

        if let Some(project_path) = Self::project_config_in(project_dir) {
            figment = figment.merge(Toml::file(project_path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/gameplan/config.toml if set,
    /// otherwise falls back to ~/.config/gameplan/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("gameplan").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        Self::project_config_in(Path::new("."))
    }

    fn project_config_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used (for `gameplan config`).
    pub fn config_sources() -> Vec<(String, Option<PathBuf>)> {
        vec![
            ("Project".to_string(), Self::project_config_path()),
            (
                "Global".to_string(),
                Self::global_config_path().filter(|p| p.exists()),
            ),
        ]
    }
}
