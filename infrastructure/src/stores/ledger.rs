//! Ledger store adapters.

use async_trait::async_trait;
use fs2::FileExt;
use gameplan_application::{LedgerStore, LedgerStoreError};
use gameplan_domain::{CreditAccount, UserId};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Process-local ledger store.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    accounts: Mutex<BTreeMap<UserId, CreditAccount>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<CreditAccount>, LedgerStoreError> {
        Ok(self.accounts.lock().await.get(user_id).cloned())
    }

    async fn create_if_absent(
        &self,
        account: CreditAccount,
    ) -> Result<CreditAccount, LedgerStoreError> {
        let mut accounts = self.accounts.lock().await;
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
        let mut accounts = self.accounts.lock().await;
        Ok(swap(&mut accounts, user_id, expected, new))
    }
}

fn swap(
    accounts: &mut BTreeMap<UserId, CreditAccount>,
    user_id: &UserId,
    expected: u64,
    new: u64,
) -> bool {
    match accounts.get_mut(user_id) {
        Some(account) if account.balance == expected => {
            account.balance = new;
            true
        }
        _ => false,
    }
}

/// Ledger persisted as one JSON document (`{userId: account}`).
///
/// Every operation holds an exclusive OS lock on `<path>.lock` from read to
/// write, so processes sharing the data directory see each other's debits.
/// Writes go through a uniquely named temporary file plus rename; a crash
/// never leaves a half-written ledger.
pub struct JsonFileLedgerStore {
    path: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` on the whole document while holding the ledger lock.
    ///
    /// File locks block the calling thread, so the work runs on the
    /// blocking pool.
    async fn locked<T, F>(&self, op: F) -> Result<T, LedgerStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, LedgerStoreError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let _lock = LedgerLock::acquire(&path)?;
            op(&path)
        })
        .await
        .map_err(|e| LedgerStoreError::Unavailable(format!("ledger task failed: {}", e)))?
    }
}

/// Exclusive advisory lock on the sidecar lock file, released on drop.
///
/// The lock file is never removed: unlinking it would let a waiter lock an
/// orphaned inode while a newcomer locks a fresh one.
struct LedgerLock {
    file: File,
}

impl LedgerLock {
    fn acquire(path: &Path) -> Result<Self, LedgerStoreError> {
        let lock_path = path.with_extension("json.lock");
        let unavailable = |e: std::io::Error| {
            LedgerStoreError::Unavailable(format!("{}: {}", lock_path.display(), e))
        };
        std::fs::create_dir_all(parent_dir(path)).map_err(unavailable)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(unavailable)?;
        file.lock_exclusive().map_err(unavailable)?;
        Ok(Self { file })
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release ledger lock: {}", e);
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn read_accounts(path: &Path) -> Result<BTreeMap<UserId, CreditAccount>, LedgerStoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => {
            return Err(LedgerStoreError::Unavailable(format!(
                "{}: {}",
                path.display(),
                e
            )));
        }
    };
    serde_json::from_slice(&bytes).map_err(|e| LedgerStoreError::Corrupt {
        user_id: "*".to_string(),
        message: format!("{}: {}", path.display(), e),
    })
}

fn write_accounts(
    path: &Path,
    accounts: &BTreeMap<UserId, CreditAccount>,
) -> Result<(), LedgerStoreError> {
    let unavailable =
        |e: std::io::Error| LedgerStoreError::Unavailable(format!("{}: {}", path.display(), e));
    let json = serde_json::to_vec_pretty(accounts)
        .map_err(|e| LedgerStoreError::Unavailable(e.to_string()))?;

    let mut tmp = NamedTempFile::new_in(parent_dir(path)).map_err(unavailable)?;
    tmp.write_all(&json).map_err(unavailable)?;
    tmp.as_file().sync_all().map_err(unavailable)?;
    tmp.persist(path).map_err(|e| unavailable(e.error))?;
    debug!("Ledger written to {}", path.display());
    Ok(())
}

#[async_trait]
impl LedgerStore for JsonFileLedgerStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<CreditAccount>, LedgerStoreError> {
        let user_id = user_id.clone();
        self.locked(move |path| Ok(read_accounts(path)?.remove(&user_id)))
            .await
    }

    async fn create_if_absent(
        &self,
        account: CreditAccount,
    ) -> Result<CreditAccount, LedgerStoreError> {
        self.locked(move |path| {
            let mut accounts = read_accounts(path)?;
            if let Some(existing) = accounts.get(&account.user_id) {
                return Ok(existing.clone());
            }
            accounts.insert(account.user_id.clone(), account.clone());
            write_accounts(path, &accounts)?;
            Ok(account)
        })
        .await
    }

    async fn compare_and_swap(
        &self,
        user_id: &UserId,
        expected: u64,
        new: u64,
    ) -> Result<bool, LedgerStoreError> {
        let user_id = user_id.clone();
        self.locked(move |path| {
            let mut accounts = read_accounts(path)?;
            if !swap(&mut accounts, &user_id, expected, new) {
                return Ok(false);
            }
            write_accounts(path, &accounts)?;
            Ok(true)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn memory_swap_requires_expected_balance() {
        let store = InMemoryLedgerStore::new();
        let user = UserId::new("u1");
        store
            .create_if_absent(CreditAccount::new(user.clone(), 5))
            .await
            .unwrap();
        assert!(!store.compare_and_swap(&user, 4, 1).await.unwrap());
        assert!(store.compare_and_swap(&user, 5, 2).await.unwrap());
        assert_eq!(store.get(&user).await.unwrap().unwrap().balance, 2);
    }

    #[tokio::test]
    async fn create_if_absent_keeps_existing_balance() {
        let store = InMemoryLedgerStore::new();
        let user = UserId::new("u1");
        store
            .create_if_absent(CreditAccount::new(user.clone(), 5))
            .await
            .unwrap();
        let account = store
            .create_if_absent(CreditAccount::new(user.clone(), 20))
            .await
            .unwrap();
        assert_eq!(account.balance, 5);
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger").join("credits.json");
        let user = UserId::new("u1");

        let store = JsonFileLedgerStore::new(&path);
        assert!(store.get(&user).await.unwrap().is_none());
        store
            .create_if_absent(CreditAccount::new(user.clone(), 10))
            .await
            .unwrap();
        assert!(store.compare_and_swap(&user, 10, 7).await.unwrap());

        let reopened = JsonFileLedgerStore::new(&path);
        assert_eq!(reopened.get(&user).await.unwrap().unwrap().balance, 7);
        assert!(!reopened.compare_and_swap(&user, 10, 0).await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credits.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonFileLedgerStore::new(&path);
        let err = store.get(&UserId::new("u1")).await.unwrap_err();
        assert!(matches!(err, LedgerStoreError::Corrupt { .. }));
    }

    /// Debit `times` credits one at a time, re-reading on every lost race.
    async fn debit_repeatedly(store: Arc<JsonFileLedgerStore>, user: UserId, times: u32) {
        for _ in 0..times {
            loop {
                let balance = store.get(&user).await.unwrap().unwrap().balance;
                if store
                    .compare_and_swap(&user, balance, balance - 1)
                    .await
                    .unwrap()
                {
                    break;
                }
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn file_stores_sharing_a_path_never_lose_debits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credits.json");
        let first = Arc::new(JsonFileLedgerStore::new(&path));
        let second = Arc::new(JsonFileLedgerStore::new(&path));
        for user in ["a", "b"] {
            first
                .create_if_absent(CreditAccount::new(UserId::new(user), 1000))
                .await
                .unwrap();
        }

        let tasks = vec![
            tokio::spawn(debit_repeatedly(first.clone(), UserId::new("a"), 40)),
            tokio::spawn(debit_repeatedly(second.clone(), UserId::new("a"), 40)),
            tokio::spawn(debit_repeatedly(first.clone(), UserId::new("b"), 40)),
            tokio::spawn(debit_repeatedly(second.clone(), UserId::new("b"), 40)),
        ];
        for task in tasks {
            task.await.unwrap();
        }

        let reopened = JsonFileLedgerStore::new(&path);
        assert_eq!(reopened.get(&UserId::new("a")).await.unwrap().unwrap().balance, 920);
        assert_eq!(reopened.get(&UserId::new("b")).await.unwrap().unwrap().balance, 920);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name != "credits.json" && name != "credits.json.lock")
            .collect();
        assert!(leftovers.is_empty(), "stray files: {:?}", leftovers);
    }
}
