use crate::error::{CoreError, CoreResult};
use crate::state::AppState;
use crate::types::*;

impl AppState {
    /// Pick one uniformly random unseen character matching the filter.
    ///
    /// A character qualifies when it is not in `seen`, carries at least one
    /// included tag (if any are given) and none of the excluded tags.
    /// An empty pool is `NotFound`, which callers surface as an empty state.
    pub async fn select_random(&self, filter: &CandidateFilter) -> CoreResult<CharacterWithTags> {
        let character = self
            .store
            .random_character(filter)
            .await?
            .ok_or_else(|| CoreError::NotFound("No character found".to_string()))?;

        let tags = self.store.character_tags(character.id).await?;

        tracing::debug!(
            character_id = character.id,
            tags = tags.len(),
            "Selected candidate"
        );
        Ok(CharacterWithTags { character, tags })
    }

    /// Every tag attached to at least one character
    pub async fn tag_universe(&self) -> CoreResult<Vec<TagName>> {
        Ok(self.store.all_tags().await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CoreError;
    use crate::state::test_support::seeded_state;
    use crate::types::*;

    fn tags(names: &[&str]) -> std::collections::BTreeSet<TagName> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_select_returns_tags() {
        let state = seeded_state();
        let filter = CandidateFilter {
            seen: [2, 3, 4].into_iter().collect(),
            ..Default::default()
        };
        let picked = state.select_random(&filter).await.unwrap();
        assert_eq!(picked.character.id, 1);
        assert_eq!(picked.tags, vec!["hero", "human"]);
    }

    #[tokio::test]
    async fn test_select_never_violates_filter() {
        let state = seeded_state();
        let filter = CandidateFilter {
            included: tags(&["hero", "villain"]),
            excluded: tags(&["human"]),
            seen: [2].into_iter().collect(),
        };
        for _ in 0..50 {
            let picked = state.select_random(&filter).await.unwrap();
            assert!(!filter.seen.contains(&picked.character.id));
            assert!(picked.tags.iter().all(|t| !filter.excluded.contains(t)));
            assert!(picked.tags.iter().any(|t| filter.included.contains(t)));
        }
    }

    #[tokio::test]
    async fn test_select_empty_pool_is_not_found() {
        let state = seeded_state();
        let filter = CandidateFilter {
            included: tags(&["nonexistent"]),
            ..Default::default()
        };
        let result = state.select_random(&filter).await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_tag_universe() {
        let state = seeded_state();
        assert_eq!(
            state.tag_universe().await.unwrap(),
            vec!["hero", "human", "robot", "villain"]
        );
    }
}
