//! Store export/import for backup and restoration between restarts.

use super::{CatalogEntry, CharacterStore};
use crate::error::{StoreError, StoreResult};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Schema version for snapshot compatibility
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Serializable copy of the catalog and the full interaction log.
/// Vote aggregates are not part of it; they are recomputed from `events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub schema_version: u32,
    /// Export timestamp (RFC3339)
    pub exported_at: String,
    pub characters: Vec<CatalogEntry>,
    #[serde(default)]
    pub events: Vec<InteractionEvent>,
}

impl StoreSnapshot {
    pub fn new(characters: Vec<CatalogEntry>, events: Vec<InteractionEvent>) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            characters,
            events,
        }
    }

    /// Validate the snapshot before import
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(format!(
                "Snapshot schema version {} is newer than supported version {}",
                self.schema_version, SNAPSHOT_SCHEMA_VERSION
            ));
        }

        let mut ids = HashSet::new();
        for entry in &self.characters {
            if !ids.insert(entry.character.id) {
                return Err(format!("Duplicate character id {}", entry.character.id));
            }
        }

        for event in &self.events {
            if !ids.contains(&event.character_id) {
                return Err(format!(
                    "Event '{}' references character {} which doesn't exist",
                    event.id, event.character_id
                ));
            }
            if event.session_id.is_empty() {
                return Err(format!("Event '{}' has no session id", event.id));
            }
        }

        Ok(())
    }

    pub async fn read_from(path: &Path) -> StoreResult<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write atomically: temp file in the same directory, then rename
    pub async fn write_to(&self, path: &Path) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Snapshot file that carries a store across restarts.
///
/// A file that exists but could not be restored is never overwritten: later
/// saves go to a timestamped side file next to it, so its events survive.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    rejected: bool,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rejected: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file on disk failed to restore and is being preserved
    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    /// Import the file into `store`. `Ok(false)` when there is no file yet.
    pub async fn restore(&mut self, store: &dyn CharacterStore) -> StoreResult<bool> {
        let snapshot = match StoreSnapshot::read_from(&self.path).await {
            Ok(snapshot) => snapshot,
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(false);
            }
            Err(e) => {
                self.rejected = true;
                return Err(e);
            }
        };

        if let Err(e) = store.import(snapshot).await {
            self.rejected = true;
            return Err(e);
        }
        Ok(true)
    }

    /// Where the next save lands
    pub fn save_path(&self) -> PathBuf {
        if !self.rejected {
            return self.path.clone();
        }
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        let extension = self
            .path
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "json".to_string());
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
        self.path
            .with_file_name(format!("{}.unsaved-{}.{}", stem, stamp, extension))
    }

    /// Export `store` and write it out; returns the path written
    pub async fn save(&self, store: &dyn CharacterStore) -> StoreResult<PathBuf> {
        let snapshot = store.export().await?;
        let path = self.save_path();
        snapshot.write_to(&path).await?;

        if self.rejected {
            tracing::warn!(
                original = %self.path.display(),
                path = %path.display(),
                "Snapshot on disk was not restored; saved alongside it instead"
            );
        }
        tracing::info!(
            path = %path.display(),
            events = snapshot.events.len(),
            "Snapshot written"
        );
        Ok(path)
    }
}
