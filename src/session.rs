//! Visitor session context.
//!
//! Holds what a single visitor's client tracks between requests: running
//! stats, tag filters, the character on screen and the in-flight guard.
//! The caller owns it and passes the shared [`AppState`] to each operation.

use crate::error::{CoreError, CoreResult};
use crate::protocol::{CharacterResults, VoteReceipt};
use crate::scoring::VoteScore;
use crate::state::AppState;
use crate::tags::TagFilterState;
use crate::types::*;

/// Outcome of a vote as the visitor sees it
#[derive(Debug, Clone)]
pub struct VoteReport {
    pub receipt: VoteReceipt,
    pub score: VoteScore,
    pub stats: VisitorStats,
    /// Rounded (yes%, no%) of the community split including this vote
    pub community_split: Option<(u32, u32)>,
    /// Share of this visitor's own votes that were yes
    pub yes_rating: Option<u32>,
}

/// Outcome of a skip: community stats without counting the skip as a vote
#[derive(Debug, Clone)]
pub struct SkipReport {
    pub results: CharacterResults,
    pub stats: VisitorStats,
    /// None when nobody has voted on the character yet
    pub community_split: Option<(u32, u32)>,
    pub yes_rating: Option<u32>,
}

pub struct VisitorSession {
    stats: VisitorStats,
    filters: TagFilterState,
    current: Option<CharacterWithTags>,
    /// Set once a vote or skip is issued; cleared only by loading the next character
    awaiting_next: bool,
}

impl VisitorSession {
    /// Start from persisted stats for `session_id` (or defaults) with every tag neutral
    pub async fn resume(state: &AppState, session_id: &str) -> CoreResult<Self> {
        let stats = state.stats.load(session_id).await?;
        let filters = TagFilterState::new(state.tag_universe().await?);
        Ok(Self::with_stats(stats, filters))
    }

    /// Brand-new visitor under a generated session id
    pub async fn start(state: &AppState) -> CoreResult<Self> {
        let stats = VisitorStats::fresh();
        state.stats.save(&stats).await?;
        let filters = TagFilterState::new(state.tag_universe().await?);
        Ok(Self::with_stats(stats, filters))
    }

    pub fn with_stats(stats: VisitorStats, filters: TagFilterState) -> Self {
        Self {
            stats,
            filters,
            current: None,
            awaiting_next: false,
        }
    }

    pub fn stats(&self) -> &VisitorStats {
        &self.stats
    }

    pub fn filters(&self) -> &TagFilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut TagFilterState {
        &mut self.filters
    }

    pub fn current(&self) -> Option<&CharacterWithTags> {
        self.current.as_ref()
    }

    pub fn is_awaiting_next(&self) -> bool {
        self.awaiting_next
    }

    /// Release the guard and show the next eligible character.
    /// `Ok(None)` means nothing is left to show for the current filters.
    pub async fn load_next(&mut self, state: &AppState) -> CoreResult<Option<&CharacterWithTags>> {
        self.awaiting_next = false;
        let filter = self.filters.candidate_filter(self.stats.seen());

        match state.select_random(&filter).await {
            Ok(character) => {
                self.current = Some(character);
                Ok(self.current.as_ref())
            }
            Err(CoreError::NotFound(_)) => {
                tracing::debug!(session_id = %self.stats.session_id, "No eligible character left");
                self.current = None;
                Ok(None)
            }
            Err(e) => {
                // The previous character was already answered; never offer it again
                self.current = None;
                Err(e)
            }
        }
    }

    /// Vote on the current character.
    ///
    /// Ignored (`Ok(None)`) when nothing is on screen or a previous vote/skip
    /// has not been followed by [`VisitorSession::load_next`] yet.
    pub async fn vote(&mut self, state: &AppState, vote: bool) -> CoreResult<Option<VoteReport>> {
        let Some(character_id) = self.claim() else {
            return Ok(None);
        };

        let receipt = match state
            .record_vote(character_id, &self.stats.session_id, vote)
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                self.awaiting_next = false;
                return Err(e);
            }
        };

        // total_votes includes this vote, so it is never zero here
        let community = receipt.vote_stats();
        let yes_percentage = community.yes_percentage().unwrap_or(50.0);
        let score = self.stats.apply_vote(character_id, vote, yes_percentage);
        state.stats.save(&self.stats).await?;

        Ok(Some(VoteReport {
            receipt,
            score,
            community_split: community.display_percentages(),
            yes_rating: self.stats.yes_rating(),
            stats: self.stats.clone(),
        }))
    }

    /// Skip the current character, then fetch its community results.
    /// Ignored under the same conditions as [`VisitorSession::vote`].
    pub async fn skip(&mut self, state: &AppState) -> CoreResult<Option<SkipReport>> {
        let Some(character_id) = self.claim() else {
            return Ok(None);
        };

        if let Err(e) = state
            .record_skip(character_id, &self.stats.session_id)
            .await
        {
            self.awaiting_next = false;
            return Err(e);
        }

        self.stats.apply_skip(character_id);
        state.stats.save(&self.stats).await?;

        let results = state.get_results(character_id).await?;
        Ok(Some(SkipReport {
            community_split: results.vote_stats.display_percentages(),
            yes_rating: self.stats.yes_rating(),
            results,
            stats: self.stats.clone(),
        }))
    }

    /// Throw away all progress and continue under a new session id
    pub async fn reset_stats(&mut self, state: &AppState) -> CoreResult<&VisitorStats> {
        self.stats = state.stats.reset(&self.stats.session_id).await?;
        Ok(&self.stats)
    }

    /// Take the in-flight guard for the current character
    fn claim(&mut self) -> Option<CharacterId> {
        if self.awaiting_next {
            return None;
        }
        let id = self.current.as_ref()?.character.id;
        self.awaiting_next = true;
        Some(id)
    }
}
