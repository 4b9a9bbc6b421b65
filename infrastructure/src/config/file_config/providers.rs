//! Provider configuration from TOML (`[providers]` section)

use crate::config::issue::{ConfigIssue, ConfigIssueCode, Severity};
use serde::{Deserialize, Serialize};

/// Names accepted by `providers.default`.
pub const PROVIDER_NAMES: [&str; 2] = ["rpc", "direct"];

/// Game service reached over HTTP endpoints and/or the callable protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRpcConfig {
    pub enabled: bool,
    /// Base URL of the plain HTTP endpoints (tried first).
    pub endpoint_url: Option<String>,
    /// Base URL of the callable functions (tried second).
    pub callable_url: Option<String>,
    pub initialize_function: String,
    pub send_function: String,
    /// Environment variable holding the bearer token for the service.
    pub id_token_env: String,
    /// Per-attempt timeout override in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for FileRpcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint_url: None,
            callable_url: None,
            initialize_function: "initializeGameSession".to_string(),
            send_function: "sendGameMessage".to_string(),
            id_token_env: "GAMEPLAN_ID_TOKEN".to_string(),
            timeout_secs: None,
        }
    }
}

impl FileRpcConfig {
    pub fn resolve_id_token(&self) -> Option<String> {
        read_env(&self.id_token_env)
    }

    fn has_transport(&self) -> bool {
        [&self.endpoint_url, &self.callable_url]
            .iter()
            .any(|url| url.as_deref().is_some_and(|u| !u.trim().is_empty()))
    }
}

/// Third-party chat-completions API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDirectApiConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key. Prefer the environment variable.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-attempt timeout override in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for FileDirectApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 512,
            timeout_secs: None,
        }
    }
}

impl FileDirectApiConfig {
    /// Explicit `api_key` first, then the named environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| read_env(&self.api_key_env))
    }
}

fn read_env(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// Provider used when a session does not name one: "rpc" or "direct".
    pub default: String,
    pub rpc: FileRpcConfig,
    pub direct: FileDirectApiConfig,
}

impl Default for FileProvidersConfig {
    fn default() -> Self {
        Self {
            default: "rpc".to_string(),
            rpc: FileRpcConfig::default(),
            direct: FileDirectApiConfig::default(),
        }
    }
}

impl FileProvidersConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        match name {
            "rpc" => self.rpc.enabled,
            "direct" => self.direct.enabled,
            _ => false,
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !PROVIDER_NAMES.contains(&self.default.as_str()) {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::InvalidEnumValue {
                    field: "providers.default".to_string(),
                    value: self.default.clone(),
                    valid_values: PROVIDER_NAMES.iter().map(|s| s.to_string()).collect(),
                },
                message: format!("providers.default: unknown provider '{}'", self.default),
            });
        } else if !self.is_enabled(&self.default) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidValue {
                    field: "providers.default".to_string(),
                },
                format!(
                    "providers.default is '{}' but [providers.{}] is disabled",
                    self.default, self.default
                ),
            ));
        }

        if self.rpc.enabled && !self.rpc.has_transport() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::MissingTransport {
                    provider: "rpc".to_string(),
                },
                "providers.rpc has neither endpoint_url nor callable_url; replies will be synthetic",
            ));
        }

        if self.direct.enabled {
            if self.direct.resolve_api_key().is_none() {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::MissingCredential {
                        provider: "direct".to_string(),
                    },
                    format!(
                        "providers.direct: no api_key and ${} is not set; replies will be synthetic",
                        self.direct.api_key_env
                    ),
                ));
            }
            if !(0.0..=2.0).contains(&self.direct.temperature) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::InvalidValue {
                        field: "providers.direct.temperature".to_string(),
                    },
                    format!(
                        "providers.direct.temperature ({}) is outside 0.0..=2.0",
                        self.direct.temperature
                    ),
                ));
            }
            if self.direct.max_tokens == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidValue {
                        field: "providers.direct.max_tokens".to_string(),
                    },
                    "providers.direct.max_tokens must be positive",
                ));
            }
        }

        issues
    }
}
