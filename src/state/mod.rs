mod interaction;
mod selection;

use crate::stats_store::{MemoryStatsStore, StatsStore};
use crate::store::{CharacterStore, MemoryStore};
use std::sync::Arc;

/// Shared application state: the storage collaborators every operation runs against
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CharacterStore>,
    pub stats: Arc<dyn StatsStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn CharacterStore>, stats: Arc<dyn StatsStore>) -> Self {
        Self { store, stats }
    }

    /// Everything held in process memory
    pub fn in_memory(store: MemoryStore) -> Self {
        Self::new(Arc::new(store), Arc::new(MemoryStatsStore::new()))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory(MemoryStore::new())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::store::{CatalogEntry, CatalogSeed, MemoryStore};
    use crate::types::*;

    pub fn entry(id: CharacterId, tags: &[&str]) -> CatalogEntry {
        CatalogEntry {
            character: Character {
                id,
                name: format!("Character {}", id),
                franchise: "Test".to_string(),
                image_url: format!("/img/{}.png", id),
            },
            tags: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Four characters: 1 hero+human, 2 villain+robot, 3 hero+robot, 4 untagged
    pub fn seeded_store() -> MemoryStore {
        MemoryStore::from_seed(CatalogSeed {
            characters: vec![
                entry(1, &["hero", "human"]),
                entry(2, &["villain", "robot"]),
                entry(3, &["hero", "robot"]),
                entry(4, &[]),
            ],
        })
        .unwrap()
    }

    pub fn seeded_state() -> super::AppState {
        super::AppState::in_memory(seeded_store())
    }
}
