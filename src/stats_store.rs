//! Key/value blob store for per-visitor statistics.
//!
//! Blobs are opaque JSON keyed by session id. An unparseable blob is treated
//! as absent: it is discarded and replaced with fresh defaults.

use crate::error::{CoreError, CoreResult, StoreError, StoreResult};
use crate::types::{SessionId, VisitorStats};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

const MAX_SESSION_ID_LEN: usize = 128;

/// A visitor id must be present; anything non-blank is accepted
pub fn require_session_id(session_id: &str) -> CoreResult<()> {
    if session_id.trim().is_empty() {
        return Err(CoreError::Validation("sessionId required".to_string()));
    }
    Ok(())
}

/// Stricter check for ids used as storage keys: `[A-Za-z0-9_-]`, at most 128 bytes
pub fn validate_session_id(session_id: &str) -> CoreResult<()> {
    require_session_id(session_id)?;
    if !is_safe_key(session_id) {
        return Err(CoreError::Validation(format!(
            "Invalid sessionId '{}'",
            session_id
        )));
    }
    Ok(())
}

fn is_safe_key(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Stats for a session; defaults when absent or corrupted
    async fn load(&self, session_id: &str) -> StoreResult<VisitorStats>;

    /// Persist under `stats.session_id`
    async fn save(&self, stats: &VisitorStats) -> StoreResult<()>;

    /// Drop a session's blob and start over under a new session id
    async fn reset(&self, session_id: &str) -> StoreResult<VisitorStats> {
        self.remove(session_id).await?;
        let fresh = VisitorStats::fresh();
        self.save(&fresh).await?;
        tracing::info!(old = session_id, new = %fresh.session_id, "Visitor stats reset");
        Ok(fresh)
    }

    async fn remove(&self, session_id: &str) -> StoreResult<()>;
}

/// Parse a stored blob, falling back to defaults on corruption
fn decode(session_id: &str, raw: &str) -> (VisitorStats, bool) {
    match serde_json::from_str::<VisitorStats>(raw) {
        Ok(mut stats) => {
            stats.session_id = session_id.to_string();
            (stats, true)
        }
        Err(e) => {
            tracing::warn!(session_id, "Discarding corrupted visitor stats: {}", e);
            (VisitorStats::for_session(session_id.to_string()), false)
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStatsStore {
    blobs: Arc<RwLock<HashMap<SessionId, String>>>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw blob as-is
    pub async fn put_raw(&self, session_id: &str, raw: String) {
        self.blobs.write().await.insert(session_id.to_string(), raw);
    }
}

#[async_trait]
impl StatsStore for MemoryStatsStore {
    async fn load(&self, session_id: &str) -> StoreResult<VisitorStats> {
        let raw = self.blobs.read().await.get(session_id).cloned();
        match raw {
            Some(raw) => {
                let (stats, ok) = decode(session_id, &raw);
                if !ok {
                    self.blobs.write().await.remove(session_id);
                }
                Ok(stats)
            }
            None => Ok(VisitorStats::for_session(session_id.to_string())),
        }
    }

    async fn save(&self, stats: &VisitorStats) -> StoreResult<()> {
        let raw = serde_json::to_string(stats)?;
        self.blobs
            .write()
            .await
            .insert(stats.session_id.clone(), raw);
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> StoreResult<()> {
        self.blobs.write().await.remove(session_id);
        Ok(())
    }
}

/// One JSON file per session under a directory
#[derive(Debug, Clone)]
pub struct FileStatsStore {
    dir: PathBuf,
}

impl FileStatsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, session_id: &str) -> StoreResult<PathBuf> {
        if !is_safe_key(session_id) {
            return Err(StoreError::Invalid(format!(
                "sessionId '{}' cannot be used as a file name",
                session_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", session_id)))
    }
}

/// Best-effort removal of a corrupted blob; the caller gets defaults either way
async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), "Failed to remove corrupted stats: {}", e);
    }
}

#[async_trait]
impl StatsStore for FileStatsStore {
    async fn load(&self, session_id: &str) -> StoreResult<VisitorStats> {
        let path = self.path_for(session_id)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(VisitorStats::for_session(session_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let (stats, ok) = decode(session_id, &raw);
        if !ok {
            discard(&path).await;
        }
        Ok(stats)
    }

    async fn save(&self, stats: &VisitorStats) -> StoreResult<()> {
        let path = self.path_for(&stats.session_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(stats)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> StoreResult<()> {
        match tokio::fs::remove_file(self.path_for(session_id)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
