//! In-memory collaborators shared by the use case tests.

use crate::ports::ledger_store::{LedgerStore, LedgerStoreError};
use crate::ports::provider_transport::{
    InitializeRequest, MessageRequest, ProviderReply, ProviderSessionSeed, ProviderTransport,
    TransportError, TransportKind,
};
use crate::ports::session_store::{SessionStore, SessionStoreError};
use crate::use_cases::provider_adapter::{
    DirectApiProvider, ProviderAdapter, RpcProvider, TransportAttempt,
};
use async_trait::async_trait;
use gameplan_domain::{CreditAccount, GameSessionSnapshot, ProviderId, SessionId, UserId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub(crate) struct MemoryLedgerStore {
    accounts: Mutex<HashMap<UserId, CreditAccount>>,
}

impl MemoryLedgerStore {
    pub(crate) fn with_balance(user: &str, balance: u64) -> Arc<Self> {
        let store = Self::default();
        store.accounts.lock().unwrap().insert(
            UserId::new(user),
            CreditAccount::new(UserId::new(user), balance),
        );
        Arc::new(store)
    }

    pub(crate) fn balance(&self, user: &str) -> Option<u64> {
        self.accounts
            .lock()
            .unwrap()
            .get(&UserId::new(user))
            .map(|a| a.balance)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<CreditAccount>, LedgerStoreError> {
        Ok(self.accounts.lock().unwrap().get(user_id).cloned())
    }

    async fn create_if_absent(
        &self,
        account: CreditAccount,
    ) -> Result<CreditAccount, LedgerStoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .entry(account.user_id.clone())
            .or_insert(account)
            .clone())
    }

    async fn compare_and_swap(
        &self,
        user_id: &UserId,
        expected: u64,
        new: u64,
    ) -> Result<bool, LedgerStoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.get_mut(user_id) {
            Some(account) if account.balance == expected => {
                account.balance = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub(crate) struct MemorySessionStore {
    snapshots: Mutex<HashMap<SessionId, GameSessionSnapshot>>,
}

impl MemorySessionStore {
    pub(crate) fn len(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(
        &self,
        session_id: &SessionId,
        snapshot: &GameSessionSnapshot,
    ) -> Result<(), SessionStoreError> {
        self.snapshots
            .lock()
            .unwrap()
            .insert(session_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn get(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<GameSessionSnapshot>, SessionStoreError> {
        Ok(self.snapshots.lock().unwrap().get(session_id).cloned())
    }
}

pub(crate) enum Step {
    /// Answer with fixed text.
    Reply(&'static str),
    /// Answer "re: <user message>" after a delay.
    EchoAfter(Duration),
    Fail,
}

/// Transport playing back scripted steps; once the script runs out every
/// call fails.
pub(crate) struct ScriptedTransport {
    name: String,
    kind: TransportKind,
    steps: Mutex<VecDeque<Step>>,
    remote_session_id: Option<&'static str>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new(name: &str, kind: TransportKind, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            kind,
            steps: Mutex::new(steps.into()),
            remote_session_id: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn with_remote_id(
        name: &str,
        kind: TransportKind,
        steps: Vec<Step>,
        remote_session_id: &'static str,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            kind,
            steps: Mutex::new(steps.into()),
            remote_session_id: Some(remote_session_id),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next(&self, echo: &str) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Fail);
        match step {
            Step::Reply(text) => Ok(text.to_string()),
            Step::EchoAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(format!("re: {}", echo))
            }
            Step::Fail => Err(TransportError::Http {
                status: 503,
                message: "unavailable".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ProviderTransport for ScriptedTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(
        &self,
        request: &InitializeRequest,
    ) -> Result<ProviderSessionSeed, TransportError> {
        let greeting = self.next(&request.topic.name).await?;
        Ok(ProviderSessionSeed {
            session_id: self.remote_session_id.map(SessionId::new),
            greeting,
            raw: None,
        })
    }

    async fn send_message(
        &self,
        request: &MessageRequest,
    ) -> Result<ProviderReply, TransportError> {
        self.next(&request.message.content)
            .await
            .map(ProviderReply::new)
    }
}

/// RPC provider `rpc` over an HTTP attempt and a callable attempt.
pub(crate) fn rpc_provider(
    http: Arc<ScriptedTransport>,
    callable: Arc<ScriptedTransport>,
) -> ProviderAdapter {
    ProviderAdapter::Rpc(RpcProvider {
        id: ProviderId::new("rpc"),
        attempts: vec![TransportAttempt::new(http), TransportAttempt::new(callable)],
    })
}

/// Direct-API provider `direct` over one chat-completions attempt.
pub(crate) fn direct_provider(transport: Arc<ScriptedTransport>) -> ProviderAdapter {
    ProviderAdapter::DirectApi(DirectApiProvider {
        id: ProviderId::new("direct"),
        attempts: vec![TransportAttempt::new(transport)],
        temperature: 0.7,
        max_tokens: 256,
    })
}
