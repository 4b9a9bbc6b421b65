//! Wiring: turns a [`FileConfig`] into a ready [`GameOrchestrator`].

use crate::config::{ConfigIssue, FileConfig, parse_topics};
use crate::content::StaticTopicCatalog;
use crate::logging::JsonlConversationLogger;
use crate::stores::{
    InMemoryLedgerStore, InMemorySessionStore, JsonFileLedgerStore, JsonFileSessionStore,
};
use crate::transports::{
    CallableRpcTransport, ChatCompletionsSettings, ChatCompletionsTransport,
    HttpEndpointTransport, ServiceEndpoints,
};
use gameplan_application::{
    ConversationLogger, CreditLedger, DirectApiProvider, FixedIdentity, GameOrchestrator,
    LedgerStore, NoConversationLogger, ProviderAdapter, ProviderRegistry, RpcProvider,
    SessionManager, SessionStore, TransportAttempt,
};
use gameplan_domain::{ProviderId, UserId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Invalid configuration: {}", .0.iter().map(|i| i.message.as_str()).collect::<Vec<_>>().join("; "))]
    InvalidConfig(Vec<ConfigIssue>),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where ledger and session data live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// JSON files under the configured data directory.
    Persistent,
    /// Process memory only; nothing survives the run.
    Ephemeral,
}

/// Runtime choices that do not come from the config file.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub user: Option<UserId>,
    pub storage: StorageMode,
    /// Overrides `[logging] transcript`.
    pub transcript: Option<PathBuf>,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            user: None,
            storage: StorageMode::Persistent,
            transcript: None,
        }
    }
}

/// Build the enabled providers. Disabled providers are left out of the
/// registry; a provider without transports still answers synthetically.
pub fn build_provider_registry(config: &FileConfig, client: &reqwest::Client) -> ProviderRegistry {
    let providers = &config.providers;
    let default_timeout = config.chain.attempt_timeout().0;
    let mut registry = ProviderRegistry::new(ProviderId::new(providers.default.as_str()));

    if providers.rpc.enabled {
        let rpc = &providers.rpc;
        let timeout = rpc
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(default_timeout);
        let token = rpc.resolve_id_token();
        let endpoints = |base_url: &str| ServiceEndpoints {
            base_url: base_url.to_string(),
            initialize: rpc.initialize_function.clone(),
            send_message: rpc.send_function.clone(),
            bearer_token: token.clone(),
        };

        let mut attempts = Vec::new();
        if let Some(url) = rpc.endpoint_url.as_deref().filter(|u| !u.trim().is_empty()) {
            attempts.push(
                TransportAttempt::new(Arc::new(HttpEndpointTransport::new(
                    client.clone(),
                    endpoints(url),
                )))
                .with_timeout(timeout),
            );
        }
        if let Some(url) = rpc.callable_url.as_deref().filter(|u| !u.trim().is_empty()) {
            attempts.push(
                TransportAttempt::new(Arc::new(CallableRpcTransport::new(
                    client.clone(),
                    endpoints(url),
                )))
                .with_timeout(timeout),
            );
        }
        if attempts.is_empty() {
            warn!("Provider rpc has no transports; it will only answer synthetically");
        }
        debug!("Provider rpc: {:?}", attempts);
        registry = registry.with_provider(ProviderAdapter::Rpc(RpcProvider {
            id: ProviderId::new("rpc"),
            attempts,
        }));
    }

    if providers.direct.enabled {
        let direct = &providers.direct;
        let timeout = direct
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(default_timeout);
        let transport = ChatCompletionsTransport::new(
            client.clone(),
            ChatCompletionsSettings {
                base_url: direct.base_url.clone(),
                model: direct.model.clone(),
                api_key: direct.resolve_api_key(),
            },
        );
        registry = registry.with_provider(ProviderAdapter::DirectApi(DirectApiProvider {
            id: ProviderId::new("direct"),
            attempts: vec![TransportAttempt::new(Arc::new(transport)).with_timeout(timeout)],
            temperature: direct.temperature,
            max_tokens: direct.max_tokens,
        }));
    }

    registry
}

fn build_stores(
    config: &FileConfig,
    mode: &StorageMode,
) -> (Arc<dyn LedgerStore>, Arc<dyn SessionStore>) {
    match mode {
        StorageMode::Ephemeral => (
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(InMemorySessionStore::new()),
        ),
        StorageMode::Persistent => {
            let ledger = JsonFileLedgerStore::new(config.storage.ledger_path());
            let sessions = JsonFileSessionStore::new(config.storage.sessions_dir());
            info!(
                "Ledger at {}, sessions in {}",
                ledger.path().display(),
                sessions.dir().display()
            );
            (Arc::new(ledger), Arc::new(sessions))
        }
    }
}

fn build_conversation_logger(
    config: &FileConfig,
    options: &BootstrapOptions,
) -> Arc<dyn ConversationLogger> {
    let path = options
        .transcript
        .clone()
        .or_else(|| config.logging.transcript.clone());
    match path.and_then(JsonlConversationLogger::new) {
        Some(logger) => {
            info!("Conversation transcript: {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoConversationLogger),
    }
}

/// Assemble the orchestrator. Fails on configuration errors; warnings are
/// logged and the fallback values are used.
pub fn build_orchestrator(
    config: &FileConfig,
    options: BootstrapOptions,
) -> Result<GameOrchestrator, BootstrapError> {
    let issues = config.validate();
    let (errors, warnings): (Vec<_>, Vec<_>) = issues.into_iter().partition(|i| i.is_error());
    for issue in &warnings {
        warn!("{}", issue.message);
    }
    if !errors.is_empty() {
        return Err(BootstrapError::InvalidConfig(errors));
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("gameplan/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let providers = build_provider_registry(config, &client);
    let params = config.to_game_params();

    let (ledger_store, session_store) = build_stores(config, &options.storage);
    let ledger = Arc::new(
        CreditLedger::new(ledger_store, params.seed_balance)
            .with_commit_attempts(params.commit_attempts),
    );

    let logger = build_conversation_logger(config, &options);
    let sessions = SessionManager::new(ledger.clone(), providers, session_store, params)
        .with_conversation_logger(logger);

    let identity = Arc::new(match options.user {
        Some(user) => FixedIdentity::signed_in(user),
        None => FixedIdentity::anonymous(),
    });
    let catalog = Arc::new(StaticTopicCatalog::with_overrides(
        parse_topics(&config.topics).0,
    ));

    Ok(GameOrchestrator::new(identity, catalog, ledger, sessions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileDirectApiConfig, FileRpcConfig};
    use gameplan_application::{GameError, ProviderFamily};
    use gameplan_domain::{Difficulty, MessageInput, ResponseSource, TopicId};

    fn offline_config() -> FileConfig {
        let mut config = FileConfig::default();
        config.providers.direct.enabled = false;
        config
    }

    #[test]
    fn rpc_attempts_follow_configured_urls() {
        let mut config = FileConfig::default();
        config.chain.attempt_timeout_secs = 12;
        config.providers.rpc = FileRpcConfig {
            endpoint_url: Some("https://game.example.com".to_string()),
            callable_url: Some("https://fn.example.com".to_string()),
            timeout_secs: Some(5),
            ..FileRpcConfig::default()
        };
        config.providers.direct = FileDirectApiConfig {
            api_key: Some("sk-test".to_string()),
            ..FileDirectApiConfig::default()
        };

        let registry = build_provider_registry(&config, &reqwest::Client::new());
        assert_eq!(registry.default_id().as_str(), "rpc");
        assert_eq!(registry.ids().len(), 2);

        let rpc = registry.get(&ProviderId::new("rpc")).unwrap();
        assert_eq!(rpc.family(), ProviderFamily::Rpc);
        let names: Vec<&str> = rpc.attempts().iter().map(|a| a.transport.name()).collect();
        assert_eq!(
            names,
            vec!["http:https://game.example.com", "callable:https://fn.example.com"]
        );
        assert!(rpc.attempts().iter().all(|a| a.timeout == Duration::from_secs(5)));

        let direct = registry.get(&ProviderId::new("direct")).unwrap();
        assert_eq!(direct.attempts()[0].timeout, Duration::from_secs(12));
    }

    #[test]
    fn disabled_providers_are_not_registered() {
        let registry = build_provider_registry(&offline_config(), &reqwest::Client::new());
        assert_eq!(registry.ids(), vec![ProviderId::new("rpc")]);
    }

    #[test]
    fn config_errors_abort_bootstrap() {
        let mut config = offline_config();
        config.providers.default = "direct".to_string();
        let err = build_orchestrator(&config, BootstrapOptions::default()).err();
        assert!(matches!(err, Some(BootstrapError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn ephemeral_game_without_transports_plays_synthetically() {
        let orchestrator = build_orchestrator(
            &offline_config(),
            BootstrapOptions {
                user: Some(UserId::new("alice")),
                storage: StorageMode::Ephemeral,
                transcript: None,
            },
        )
        .unwrap();
        assert_eq!(orchestrator.open_account().await.unwrap(), 20);

        let session = orchestrator
            .start_session(&TopicId::new("intro-ai"), Difficulty::Easy, None)
            .await
            .unwrap();
        assert!(session.is_degraded());

        let outcome = orchestrator
            .send_message(session.id(), MessageInput::text("What is a neuron?"))
            .await
            .unwrap();
        assert_eq!(outcome.source, ResponseSource::Synthetic);
        assert_eq!(orchestrator.balance().await.unwrap(), 20 - 3 - 1);
    }

    #[tokio::test]
    async fn persistent_stores_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = offline_config();
        config.storage.data_dir = Some(dir.path().to_path_buf());
        let options = BootstrapOptions {
            user: Some(UserId::new("bob")),
            ..BootstrapOptions::default()
        };

        let first = build_orchestrator(&config, options.clone()).unwrap();
        first.open_account().await.unwrap();
        let session = first
            .start_session(&TopicId::new("prompting"), Difficulty::Hard, None)
            .await
            .unwrap();
        first.save_session(session.id()).await.unwrap();

        let second = build_orchestrator(&config, options).unwrap();
        assert_eq!(second.balance().await.unwrap(), 17);
        let loaded = second.load_session(session.id()).await.unwrap();
        assert_eq!(loaded.topic().id, TopicId::new("prompting"));
        assert!(matches!(
            second.load_session(&gameplan_domain::SessionId::new("missing")).await,
            Err(GameError::SessionNotFound(_))
        ));
    }
}
