//! Request and response bodies of the HTTP API.

use crate::error::{CoreError, CoreResult};
use crate::stats_store::require_session_id;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Query string of `GET /api/character/random`: comma-joined lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateQuery {
    pub tags: Option<String>,
    pub exclude: Option<String>,
    pub exclude_ids: Option<String>,
}

impl CandidateQuery {
    /// Parse into a filter. Tag names are trimmed and blanks dropped;
    /// ids that are not integers are ignored.
    pub fn to_filter(&self) -> CandidateFilter {
        CandidateFilter {
            included: split_tags(self.tags.as_deref()),
            excluded: split_tags(self.exclude.as_deref()),
            seen: self
                .exclude_ids
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .filter_map(|id| id.trim().parse().ok())
                .collect(),
        }
    }
}

fn split_tags(raw: Option<&str>) -> BTreeSet<TagName> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Body of `POST /api/character/{id}/vote`.
///
/// Fields are loosely typed so that a wrong type is reported as a
/// validation error rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub session_id: Option<serde_json::Value>,
    pub vote_type: Option<serde_json::Value>,
}

impl VoteRequest {
    pub fn validate(&self) -> CoreResult<(SessionId, bool)> {
        let session_id = session_id_field(self.session_id.as_ref())?;
        match self.vote_type {
            Some(serde_json::Value::Bool(vote)) => Ok((session_id, vote)),
            _ => Err(CoreError::Validation(
                "sessionId and voteType (boolean) required".to_string(),
            )),
        }
    }
}

/// Body of `POST /api/character/{id}/skip`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipRequest {
    pub session_id: Option<serde_json::Value>,
}

impl SkipRequest {
    pub fn validate(&self) -> CoreResult<SessionId> {
        session_id_field(self.session_id.as_ref())
    }
}

fn session_id_field(raw: Option<&serde_json::Value>) -> CoreResult<SessionId> {
    match raw {
        Some(serde_json::Value::String(id)) => {
            require_session_id(id)?;
            Ok(id.clone())
        }
        _ => Err(CoreError::Validation("sessionId required".to_string())),
    }
}

/// Prospective aggregate returned after a vote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub success: bool,
    pub character_id: CharacterId,
    pub vote_type: bool,
    pub total_votes: u64,
    pub new_yes_votes: u64,
    pub new_no_votes: u64,
}

impl VoteReceipt {
    pub fn vote_stats(&self) -> VoteStats {
        VoteStats::new(self.new_yes_votes, self.new_no_votes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkipReceipt {
    pub success: bool,
    pub character_id: CharacterId,
}

/// Non-mutating read of a character and its current aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CharacterResults {
    pub character: Character,
    pub vote_stats: VoteStats,
}
