use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Opaque ID types
pub type CharacterId = i64;
pub type SessionId = String;
pub type TagName = String;
pub type EventId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub franchise: String,
    pub image_url: String,
}

/// A character together with every tag attached to it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterWithTags {
    #[serde(flatten)]
    pub character: Character,
    pub tags: Vec<TagName>,
}

/// Aggregate yes/no split for one character, always derived from the event log
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteStats {
    pub total_votes: u64,
    pub yes_votes: u64,
    pub no_votes: u64,
}

impl VoteStats {
    pub fn new(yes_votes: u64, no_votes: u64) -> Self {
        Self {
            total_votes: yes_votes + no_votes,
            yes_votes,
            no_votes,
        }
    }

    /// Exact yes share in 0..=100, or None when nobody has voted yet
    pub fn yes_percentage(&self) -> Option<f64> {
        if self.total_votes == 0 {
            return None;
        }
        Some(self.yes_votes as f64 / self.total_votes as f64 * 100.0)
    }

    /// Rounded (yes%, no%) pair for display; the two always sum to 100
    pub fn display_percentages(&self) -> Option<(u32, u32)> {
        let yes = self.yes_percentage()?.round() as u32;
        Some((yes, 100 - yes))
    }
}

/// What a visitor did with a character. A skip never carries a vote value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action_type", rename_all = "lowercase")]
pub enum Action {
    Vote { vote_type: bool },
    Skip,
}

/// Immutable entry of the append-only interaction log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionEvent {
    pub id: EventId,
    pub character_id: CharacterId,
    pub session_id: SessionId,
    #[serde(flatten)]
    pub action: Action,
    /// RFC3339 timestamp
    pub interacted_at: String,
}

impl InteractionEvent {
    pub fn vote(character_id: CharacterId, session_id: &str, vote_type: bool) -> Self {
        Self::new(character_id, session_id, Action::Vote { vote_type })
    }

    pub fn skip(character_id: CharacterId, session_id: &str) -> Self {
        Self::new(character_id, session_id, Action::Skip)
    }

    fn new(character_id: CharacterId, session_id: &str, action: Action) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            character_id,
            session_id: session_id.to_string(),
            action,
            interacted_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn vote_value(&self) -> Option<bool> {
        match self.action {
            Action::Vote { vote_type } => Some(vote_type),
            Action::Skip => None,
        }
    }
}

/// Filter parameters handed to the storage collaborator for candidate selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    /// Candidate must carry at least one of these (ignored when empty)
    pub included: BTreeSet<TagName>,
    /// Candidate must carry none of these
    pub excluded: BTreeSet<TagName>,
    pub seen: BTreeSet<CharacterId>,
}

impl CandidateFilter {
    /// Whether a character with the given id and tags passes this filter
    pub fn admits<'a, I>(&self, id: CharacterId, tags: I) -> bool
    where
        I: IntoIterator<Item = &'a TagName>,
    {
        if self.seen.contains(&id) {
            return false;
        }
        let mut any_included = self.included.is_empty();
        for tag in tags {
            if self.excluded.contains(tag) {
                return false;
            }
            if self.included.contains(tag) {
                any_included = true;
            }
        }
        any_included
    }
}

/// Per-visitor running totals, persisted as an opaque blob keyed by session id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VisitorStats {
    pub majority_streak: u32,
    pub minority_streak: u32,
    pub majority_total: u32,
    pub minority_total: u32,
    pub yes_votes_total: u32,
    pub no_votes_total: u32,
    pub skips_total: u32,
    pub majority_points: u64,
    pub minority_points: u64,
    pub last_earned_points: u64,
    /// Seen set, in the order characters were shown
    pub interacted_characters: Vec<CharacterId>,
    pub session_id: SessionId,
}

impl VisitorStats {
    /// Fresh all-zero stats under a newly generated session id
    pub fn fresh() -> Self {
        Self::for_session(generate_session_id())
    }

    pub fn for_session(session_id: SessionId) -> Self {
        Self {
            majority_streak: 0,
            minority_streak: 0,
            majority_total: 0,
            minority_total: 0,
            yes_votes_total: 0,
            no_votes_total: 0,
            skips_total: 0,
            majority_points: 0,
            minority_points: 0,
            last_earned_points: 0,
            interacted_characters: Vec::new(),
            session_id,
        }
    }

    pub fn seen(&self) -> BTreeSet<CharacterId> {
        self.interacted_characters.iter().copied().collect()
    }

    /// Share of yes votes among all of this visitor's votes, rounded.
    /// None before the first vote.
    pub fn yes_rating(&self) -> Option<u32> {
        let total = self.yes_votes_total + self.no_votes_total;
        if total == 0 {
            return None;
        }
        Some((self.yes_votes_total as f64 / total as f64 * 100.0).round() as u32)
    }
}

/// Generate a new anonymous visitor id
pub fn generate_session_id() -> SessionId {
    format!("sess-{}", ulid::Ulid::new().to_string().to_lowercase())
}
