//! Storage collaborator for characters, tags and the interaction log.

mod memory;
mod snapshot;

use crate::error::{StoreError, StoreResult};
use crate::types::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub use memory::MemoryStore;
pub use snapshot::{SnapshotFile, StoreSnapshot, SNAPSHOT_SCHEMA_VERSION};

/// Primitives the selection and recording paths need from storage.
///
/// Vote aggregates are never stored: `vote_counts` is always a count over
/// the events appended so far.
#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// One uniformly random character admitted by `filter`, or None
    async fn random_character(&self, filter: &CandidateFilter) -> StoreResult<Option<Character>>;

    /// Names of the tags attached to a character
    async fn character_tags(&self, id: CharacterId) -> StoreResult<Vec<TagName>>;

    async fn get_character(&self, id: CharacterId) -> StoreResult<Option<Character>>;

    /// Append an immutable event; fails for unknown characters
    async fn append_event(&self, event: InteractionEvent) -> StoreResult<()>;

    /// Yes/no split over vote events for one character
    async fn vote_counts(&self, id: CharacterId) -> StoreResult<VoteStats>;

    /// Every tag attached to at least one character
    async fn all_tags(&self) -> StoreResult<Vec<TagName>>;

    /// A visitor's events, newest first
    async fn events_for_session(&self, session_id: &str) -> StoreResult<Vec<InteractionEvent>>;

    /// Serializable copy of catalog and log
    async fn export(&self) -> StoreResult<StoreSnapshot> {
        Err(StoreError::Unavailable(
            "snapshot export not supported by this store".to_string(),
        ))
    }

    /// Replace catalog and log wholesale
    async fn import(&self, _snapshot: StoreSnapshot) -> StoreResult<()> {
        Err(StoreError::Unavailable(
            "snapshot import not supported by this store".to_string(),
        ))
    }
}

/// One catalog entry as it appears in the seed file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub character: Character,
    #[serde(default)]
    pub tags: Vec<TagName>,
}

/// Seed file contents: `{ "characters": [ ... ] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    pub characters: Vec<CatalogEntry>,
}

impl CatalogSeed {
    /// Read and validate a seed file
    pub async fn load(path: &Path) -> StoreResult<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let seed: CatalogSeed = serde_json::from_str(&raw)?;
        seed.validate()?;
        Ok(seed)
    }

    pub fn validate(&self) -> StoreResult<()> {
        let mut ids = HashSet::new();
        for entry in &self.characters {
            if !ids.insert(entry.character.id) {
                return Err(StoreError::Invalid(format!(
                    "Duplicate character id {} in catalog",
                    entry.character.id
                )));
            }
            if entry.tags.iter().any(|t| t.trim().is_empty()) {
                return Err(StoreError::Invalid(format!(
                    "Character {} has an empty tag name",
                    entry.character.id
                )));
            }
        }
        Ok(())
    }
}
