use super::{CatalogEntry, CatalogSeed, CharacterStore, StoreSnapshot};
use crate::error::{StoreError, StoreResult};
use crate::types::*;
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process store: catalog plus append-only interaction log.
///
/// Reads and appends take the lock independently, so a caller that reads
/// counts and then appends may miss a concurrent voter's event. Nothing is
/// ever lost, since counts are recomputed from the log on every read.
#[derive(Clone, Default)]
pub struct MemoryStore {
    characters: Arc<RwLock<BTreeMap<CharacterId, CatalogEntry>>>,
    events: Arc<RwLock<Vec<InteractionEvent>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: CatalogSeed) -> StoreResult<Self> {
        seed.validate()?;
        let characters = seed
            .characters
            .into_iter()
            .map(|entry| (entry.character.id, entry))
            .collect();
        Ok(Self {
            characters: Arc::new(RwLock::new(characters)),
            events: Arc::new(RwLock::new(Vec::new())),
        })
    }

    pub async fn character_count(&self) -> usize {
        self.characters.read().await.len()
    }

    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }
}

#[async_trait]
impl CharacterStore for MemoryStore {
    async fn random_character(&self, filter: &CandidateFilter) -> StoreResult<Option<Character>> {
        let characters = self.characters.read().await;
        let eligible: Vec<&CatalogEntry> = characters
            .values()
            .filter(|entry| filter.admits(entry.character.id, &entry.tags))
            .collect();

        tracing::debug!(
            eligible = eligible.len(),
            included = filter.included.len(),
            excluded = filter.excluded.len(),
            seen = filter.seen.len(),
            "Candidate pool computed"
        );

        Ok(eligible
            .choose(&mut rand::rng())
            .map(|entry| entry.character.clone()))
    }

    async fn character_tags(&self, id: CharacterId) -> StoreResult<Vec<TagName>> {
        self.characters
            .read()
            .await
            .get(&id)
            .map(|entry| entry.tags.clone())
            .ok_or(StoreError::UnknownCharacter(id))
    }

    async fn get_character(&self, id: CharacterId) -> StoreResult<Option<Character>> {
        Ok(self
            .characters
            .read()
            .await
            .get(&id)
            .map(|entry| entry.character.clone()))
    }

    async fn append_event(&self, event: InteractionEvent) -> StoreResult<()> {
        if !self.characters.read().await.contains_key(&event.character_id) {
            return Err(StoreError::UnknownCharacter(event.character_id));
        }
        self.events.write().await.push(event);
        Ok(())
    }

    async fn vote_counts(&self, id: CharacterId) -> StoreResult<VoteStats> {
        let events = self.events.read().await;
        let (mut yes, mut no) = (0, 0);
        for vote in events
            .iter()
            .filter(|e| e.character_id == id)
            .filter_map(InteractionEvent::vote_value)
        {
            if vote {
                yes += 1;
            } else {
                no += 1;
            }
        }
        Ok(VoteStats::new(yes, no))
    }

    async fn all_tags(&self) -> StoreResult<Vec<TagName>> {
        let characters = self.characters.read().await;
        let tags: BTreeSet<&TagName> = characters.values().flat_map(|e| e.tags.iter()).collect();
        Ok(tags.into_iter().cloned().collect())
    }

    async fn events_for_session(&self, session_id: &str) -> StoreResult<Vec<InteractionEvent>> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn export(&self) -> StoreResult<StoreSnapshot> {
        let characters = self.characters.read().await.values().cloned().collect();
        let events = self.events.read().await.clone();
        Ok(StoreSnapshot::new(characters, events))
    }

    async fn import(&self, snapshot: StoreSnapshot) -> StoreResult<()> {
        snapshot.validate().map_err(StoreError::Invalid)?;

        let characters: BTreeMap<_, _> = snapshot
            .characters
            .into_iter()
            .map(|entry| (entry.character.id, entry))
            .collect();
        let (character_count, event_count) = (characters.len(), snapshot.events.len());

        let mut current_characters = self.characters.write().await;
        let mut current_events = self.events.write().await;
        *current_characters = characters;
        *current_events = snapshot.events;

        tracing::info!(character_count, event_count, "Store snapshot imported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: CharacterId, tags: &[&str]) -> CatalogEntry {
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

    fn store() -> MemoryStore {
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

    fn set<T: Ord + Clone>(items: &[T]) -> BTreeSet<T> {
        items.iter().cloned().collect()
    }

    #[tokio::test]
    async fn test_random_respects_filters() {
        let store = store();
        let filter = CandidateFilter {
            included: set(&["hero".to_string(), "villain".to_string()]),
            excluded: set(&["robot".to_string()]),
            seen: BTreeSet::new(),
        };

        // Only character 1 is a hero/villain without the robot tag
        for _ in 0..20 {
            let picked = store.random_character(&filter).await.unwrap().unwrap();
            assert_eq!(picked.id, 1);
        }
    }

    #[tokio::test]
    async fn test_random_skips_seen_and_exhausts() {
        let store = store();
        let mut seen = BTreeSet::new();
        for _ in 0..4 {
            let filter = CandidateFilter {
                seen: seen.clone(),
                ..Default::default()
            };
            let picked = store.random_character(&filter).await.unwrap().unwrap();
            assert!(seen.insert(picked.id), "returned an already seen character");
        }

        let filter = CandidateFilter {
            seen,
            ..Default::default()
        };
        assert!(store.random_character(&filter).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_untagged_character_only_without_inclusion() {
        let store = store();
        let filter = CandidateFilter {
            seen: set(&[1, 2, 3]),
            ..Default::default()
        };
        assert_eq!(
            store.random_character(&filter).await.unwrap().map(|c| c.id),
            Some(4)
        );

        let filter = CandidateFilter {
            included: set(&["hero".to_string()]),
            seen: set(&[1, 3]),
            ..Default::default()
        };
        assert!(store.random_character(&filter).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_random_eventually_covers_pool() {
        let store = store();
        let filter = CandidateFilter {
            included: set(&["hero".to_string()]),
            ..Default::default()
        };
        let mut picked = BTreeSet::new();
        for _ in 0..200 {
            picked.insert(store.random_character(&filter).await.unwrap().unwrap().id);
        }
        assert_eq!(picked, set(&[1, 3]));
    }

    #[tokio::test]
    async fn test_vote_counts_derived_from_log() {
        let store = store();
        store.append_event(InteractionEvent::vote(1, "a", true)).await.unwrap();
        store.append_event(InteractionEvent::vote(1, "b", true)).await.unwrap();
        store.append_event(InteractionEvent::vote(1, "c", false)).await.unwrap();
        store.append_event(InteractionEvent::skip(1, "d")).await.unwrap();
        store.append_event(InteractionEvent::vote(2, "a", false)).await.unwrap();

        assert_eq!(store.vote_counts(1).await.unwrap(), VoteStats::new(2, 1));
        assert_eq!(store.vote_counts(2).await.unwrap(), VoteStats::new(0, 1));
        assert_eq!(store.vote_counts(3).await.unwrap(), VoteStats::default());
    }

    #[tokio::test]
    async fn test_append_unknown_character_fails() {
        let store = store();
        let result = store.append_event(InteractionEvent::vote(99, "a", true)).await;
        assert!(matches!(result, Err(StoreError::UnknownCharacter(99))));
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn test_all_tags_sorted_and_unique() {
        let store = store();
        assert_eq!(
            store.all_tags().await.unwrap(),
            vec!["hero", "human", "robot", "villain"]
        );
    }

    #[tokio::test]
    async fn test_events_for_session_newest_first() {
        let store = store();
        store.append_event(InteractionEvent::vote(1, "a", true)).await.unwrap();
        store.append_event(InteractionEvent::skip(2, "b")).await.unwrap();
        store.append_event(InteractionEvent::skip(3, "a")).await.unwrap();

        let history = store.events_for_session("a").await.unwrap();
        let ids: Vec<_> = history.iter().map(|e| e.character_id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_concurrent_appends_never_lose_votes() {
        let store = store();
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let session = format!("sess-{}", i);
                store
                    .append_event(InteractionEvent::vote(1, &session, i % 2 == 0))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.vote_counts(1).await.unwrap(), VoteStats::new(25, 25));
    }

    #[tokio::test]
    async fn test_export_import_roundtrip() {
        let store = store();
        store.append_event(InteractionEvent::vote(2, "a", true)).await.unwrap();
        let snapshot = store.export().await.unwrap();

        let restored = MemoryStore::new();
        restored.import(snapshot).await.unwrap();
        assert_eq!(restored.character_count().await, 4);
        assert_eq!(restored.vote_counts(2).await.unwrap(), VoteStats::new(1, 0));
    }
}
