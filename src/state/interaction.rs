use crate::error::{CoreError, CoreResult};
use crate::protocol::{CharacterResults, SkipReceipt, VoteReceipt};
use crate::state::AppState;
use crate::stats_store::require_session_id;
use crate::types::*;

impl AppState {
    /// Record a yes/no vote and return the aggregate as it stands with this vote.
    ///
    /// The returned counts are the counts read before appending plus this
    /// vote; they are not re-read afterwards. Two simultaneous voters may each
    /// be told a total that leaves out the other's vote.
    pub async fn record_vote(
        &self,
        character_id: CharacterId,
        session_id: &str,
        vote: bool,
    ) -> CoreResult<VoteReceipt> {
        require_session_id(session_id)?;

        let current = self.store.vote_counts(character_id).await?;
        let (new_yes_votes, new_no_votes) = if vote {
            (current.yes_votes + 1, current.no_votes)
        } else {
            (current.yes_votes, current.no_votes + 1)
        };

        self.store
            .append_event(InteractionEvent::vote(character_id, session_id, vote))
            .await?;

        tracing::info!(
            character_id,
            session_id,
            vote,
            yes = new_yes_votes,
            no = new_no_votes,
            "Vote recorded"
        );

        Ok(VoteReceipt {
            success: true,
            character_id,
            vote_type: vote,
            total_votes: new_yes_votes + new_no_votes,
            new_yes_votes,
            new_no_votes,
        })
    }

    /// Record a skip; skips never count towards the vote aggregate
    pub async fn record_skip(
        &self,
        character_id: CharacterId,
        session_id: &str,
    ) -> CoreResult<SkipReceipt> {
        require_session_id(session_id)?;

        self.store
            .append_event(InteractionEvent::skip(character_id, session_id))
            .await?;

        tracing::info!(character_id, session_id, "Skip recorded");
        Ok(SkipReceipt {
            success: true,
            character_id,
        })
    }

    /// A character and its current aggregate, without recording anything
    pub async fn get_results(&self, character_id: CharacterId) -> CoreResult<CharacterResults> {
        let character = self
            .store
            .get_character(character_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Character not found".to_string()))?;
        let vote_stats = self.store.vote_counts(character_id).await?;

        Ok(CharacterResults {
            character,
            vote_stats,
        })
    }

    /// A visitor's interaction history, newest first
    pub async fn session_interactions(&self, session_id: &str) -> CoreResult<Vec<InteractionEvent>> {
        require_session_id(session_id)?;
        Ok(self.store.events_for_session(session_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CoreError;
    use crate::state::test_support::seeded_state;
    use crate::types::*;

    #[tokio::test]
    async fn test_first_vote_counts_itself() {
        let state = seeded_state();
        let receipt = state.record_vote(1, "sess-a", true).await.unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.total_votes, 1);
        assert_eq!(receipt.new_yes_votes, 1);
        assert_eq!(receipt.new_no_votes, 0);
    }

    #[tokio::test]
    async fn test_vote_aggregate_accumulates() {
        let state = seeded_state();
        state.record_vote(1, "sess-a", true).await.unwrap();
        state.record_vote(1, "sess-b", true).await.unwrap();
        let receipt = state.record_vote(1, "sess-c", false).await.unwrap();

        assert_eq!(receipt.total_votes, 3);
        assert_eq!(receipt.new_yes_votes, 2);
        assert_eq!(receipt.new_no_votes, 1);
        assert!(!receipt.vote_type);
    }

    #[tokio::test]
    async fn test_vote_requires_session() {
        let state = seeded_state();
        let result = state.record_vote(1, "", true).await;
        assert!(matches!(result, Err(CoreError::Validation(_))));

        let results = state.get_results(1).await.unwrap();
        assert_eq!(results.vote_stats.total_votes, 0);
    }

    #[tokio::test]
    async fn test_vote_unknown_character() {
        let state = seeded_state();
        let result = state.record_vote(42, "sess-a", true).await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_skip_does_not_change_aggregate() {
        let state = seeded_state();
        state.record_vote(2, "sess-a", false).await.unwrap();
        let receipt = state.record_skip(2, "sess-b").await.unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.character_id, 2);

        let results = state.get_results(2).await.unwrap();
        assert_eq!(results.character.id, 2);
        assert_eq!(results.vote_stats, VoteStats::new(0, 1));
    }

    #[tokio::test]
    async fn test_skip_requires_session() {
        let state = seeded_state();
        assert!(matches!(
            state.record_skip(1, "  ").await,
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_free_form_session_ids_are_recorded() {
        let state = seeded_state();
        state.record_vote(1, "user@example.com", true).await.unwrap();
        state.record_skip(2, "user@example.com").await.unwrap();

        let history = state.session_interactions("user@example.com").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|e| e.session_id == "user@example.com"));
    }

    #[tokio::test]
    async fn test_results_unknown_character() {
        let state = seeded_state();
        assert!(matches!(
            state.get_results(99).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_session_interactions() {
        let state = seeded_state();
        state.record_vote(1, "sess-a", true).await.unwrap();
        state.record_skip(2, "sess-a").await.unwrap();
        state.record_vote(3, "sess-b", false).await.unwrap();

        let history = state.session_interactions("sess-a").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, Action::Skip);
        assert_eq!(history[1].vote_value(), Some(true));
    }
}
