//! Transport fallback chain.
//!
//! For one logical operation the chain walks the provider's transport plan
//! in order, one attempt at a time:
//!
//! 1. Each attempt races its timeout. On timeout the attempt's future is
//!    dropped, so a late response can never land after the chain moved on.
//! 2. The first success wins and is tagged `primary` (first attempt of the
//!    plan) or `secondary` (any later attempt).
//! 3. If every attempt fails, the fold ends in [`AllTransportsExhausted`],
//!    which is resolved into a synthetic reply tagged `synthetic`. Callers
//!    always get a usable value.
//!
//! Failed attempts trip a per-provider circuit flag for the life of the
//! process so later operations skip transports known to be down.

use super::provider_adapter::{ProviderAdapter, TransportAttempt};
use crate::config::ChainParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::provider_transport::TransportError;
use futures::future::BoxFuture;
use gameplan_domain::{OperationKind, ProviderId, ResponseSource};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// One failed attempt, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportFailure {
    pub transport: String,
    /// Position of the attempt in the provider's plan.
    pub position: usize,
    pub error: TransportError,
}

/// Every attempt of the plan failed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("All {} transport attempt(s) for provider {provider} failed", .failures.len())]
pub struct AllTransportsExhausted {
    pub provider: ProviderId,
    pub failures: Vec<TransportFailure>,
}

/// Result of running the chain for one operation.
#[derive(Debug, Clone)]
pub struct ChainOutcome<T> {
    pub value: T,
    pub source: ResponseSource,
    /// Name of the transport that answered; `None` for synthetic results.
    pub transport: Option<String>,
    /// Attempts that failed before the result was produced.
    pub failures: Vec<TransportFailure>,
}

impl<T> ChainOutcome<T> {
    pub fn is_synthetic(&self) -> bool {
        self.source.is_synthetic()
    }
}

/// First-success-wins combinator over a provider's transport attempts.
pub struct TransportFallbackChain {
    params: ChainParams,
    /// Provider -> positions of attempts that failed in this process.
    tripped: Mutex<HashMap<ProviderId, BTreeSet<usize>>>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl TransportFallbackChain {
    pub fn new(params: ChainParams) -> Self {
        Self {
            params,
            tripped: Mutex::new(HashMap::new()),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Run `call` against each planned attempt until one succeeds; fall back
    /// to `synthesize` when all fail.
    pub async fn execute<'a, T>(
        &self,
        provider: &'a ProviderAdapter,
        operation: OperationKind,
        call: impl Fn(&'a TransportAttempt) -> BoxFuture<'a, Result<T, TransportError>>,
        synthesize: impl FnOnce() -> T,
    ) -> ChainOutcome<T> {
        match self.fold_attempts(provider, operation, call).await {
            Ok(outcome) => outcome,
            Err(exhausted) => {
                warn!(
                    "{} for {}; answering with a synthetic response",
                    exhausted, operation
                );
                self.conversation_logger.log(ConversationEvent::new(
                    "synthetic_fallback",
                    serde_json::json!({
                        "provider": provider.id().as_str(),
                        "operation": operation.as_str(),
                        "failed_attempts": exhausted.failures.len(),
                    }),
                ));
                ChainOutcome {
                    value: synthesize(),
                    source: ResponseSource::Synthetic,
                    transport: None,
                    failures: exhausted.failures,
                }
            }
        }
    }

    async fn fold_attempts<'a, T>(
        &self,
        provider: &'a ProviderAdapter,
        operation: OperationKind,
        call: impl Fn(&'a TransportAttempt) -> BoxFuture<'a, Result<T, TransportError>>,
    ) -> Result<ChainOutcome<T>, AllTransportsExhausted> {
        let attempts = provider.attempts();
        let mut failures = Vec::new();

        for position in self.plan(provider) {
            let attempt = &attempts[position];
            let name = attempt.transport.name().to_string();
            debug!(
                "{} via {} ({}, attempt {}/{}, timeout {:?})",
                operation,
                name,
                attempt.transport.kind(),
                position + 1,
                attempts.len(),
                attempt.timeout
            );

            let result = match tokio::time::timeout(attempt.timeout, call(attempt)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(attempt.timeout)),
            };

            match result {
                Ok(value) => {
                    self.reset(provider.id(), position);
                    let source = ResponseSource::for_attempt(position);
                    info!(
                        "{} answered by {} for provider {} ({})",
                        operation,
                        name,
                        provider.id(),
                        source
                    );
                    return Ok(ChainOutcome {
                        value,
                        source,
                        transport: Some(name),
                        failures,
                    });
                }
                Err(error) => {
                    warn!("Transport {} failed for {}: {}", name, operation, error);
                    self.trip(provider.id(), position);
                    self.conversation_logger.log(ConversationEvent::new(
                        "transport_failed",
                        serde_json::json!({
                            "provider": provider.id().as_str(),
                            "operation": operation.as_str(),
                            "transport": name,
                            "position": position,
                            "error": error.to_string(),
                        }),
                    ));
                    failures.push(TransportFailure {
                        transport: name,
                        position,
                        error,
                    });
                }
            }
        }

        Err(AllTransportsExhausted {
            provider: provider.id().clone(),
            failures,
        })
    }

    /// Attempt positions to try, in order.
    ///
    /// Tripped attempts are skipped unless that would leave nothing to try,
    /// in which case the whole plan runs again.
    fn plan(&self, provider: &ProviderAdapter) -> Vec<usize> {
        let all: Vec<usize> = (0..provider.attempts().len()).collect();
        if !self.params.skip_tripped_transports {
            return all;
        }
        let tripped = self.tripped.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(bad) = tripped.get(provider.id()) else {
            return all;
        };
        let healthy: Vec<usize> = all.iter().copied().filter(|p| !bad.contains(p)).collect();
        if healthy.is_empty() {
            debug!(
                "Every transport of {} is tripped; retrying the full plan",
                provider.id()
            );
            all
        } else {
            healthy
        }
    }

    fn trip(&self, provider: &ProviderId, position: usize) {
        let mut tripped = self.tripped.lock().unwrap_or_else(PoisonError::into_inner);
        tripped.entry(provider.clone()).or_default().insert(position);
    }

    fn reset(&self, provider: &ProviderId, position: usize) {
        let mut tripped = self.tripped.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bad) = tripped.get_mut(provider) {
            bad.remove(&position);
            if bad.is_empty() {
                tripped.remove(provider);
            }
        }
    }

    /// Positions currently tripped for `provider`.
    pub fn tripped(&self, provider: &ProviderId) -> Vec<usize> {
        let tripped = self.tripped.lock().unwrap_or_else(PoisonError::into_inner);
        tripped
            .get(provider)
            .map(|bad| bad.iter().copied().collect())
            .unwrap_or_default()
    }
}
