//! Session store adapters.

use async_trait::async_trait;
use gameplan_application::{SessionStore, SessionStoreError};
use gameplan_domain::{GameSessionSnapshot, SessionId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct InMemorySessionStore {
    snapshots: RwLock<HashMap<SessionId, GameSessionSnapshot>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(
        &self,
        session_id: &SessionId,
        snapshot: &GameSessionSnapshot,
    ) -> Result<(), SessionStoreError> {
        self.snapshots
            .write()
            .await
            .insert(session_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn get(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<GameSessionSnapshot>, SessionStoreError> {
        Ok(self.snapshots.read().await.get(session_id).cloned())
    }
}

/// One pretty-printed JSON file per session: `<dir>/<session-id>.json`.
pub struct JsonFileSessionStore {
    dir: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &SessionId) -> Result<PathBuf, SessionStoreError> {
        let id = session_id.as_str();
        if id.is_empty() {
            return Err(SessionStoreError::Io("session id is empty".to_string()));
        }
        Ok(self.dir.join(format!("{}.json", file_stem(id))))
    }
}

/// Percent-encode everything outside `[A-Za-z0-9_-]`, so any remotely
/// assigned id maps to exactly one file directly inside the store directory.
fn file_stem(id: &str) -> String {
    let mut stem = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn put(
        &self,
        session_id: &SessionId,
        snapshot: &GameSessionSnapshot,
    ) -> Result<(), SessionStoreError> {
        let path = self.path_for(session_id)?;
        let io = |e: std::io::Error| SessionStoreError::Io(format!("{}: {}", path.display(), e));
        tokio::fs::create_dir_all(&self.dir).await.map_err(io)?;
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| SessionStoreError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(io)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io)?;
        debug!("Session {} written to {}", session_id, path.display());
        Ok(())
    }

    async fn get(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<GameSessionSnapshot>, SessionStoreError> {
        let path = self.path_for(session_id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionStoreError::Io(format!("{}: {}", path.display(), e))),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| SessionStoreError::Serialization(format!("{}: {}", path.display(), e)))
    }
}
