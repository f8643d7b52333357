//! Majority/minority scoring of a visitor's votes.
//!
//! A vote is scored against the yes share of the character's aggregate
//! *including* that vote. Points grow with the distance from an even split:
//! two per percentage point for siding with the majority, three for the
//! minority.

use crate::types::{CharacterId, VisitorStats};
use serde::{Deserialize, Serialize};

const MAJORITY_SLOPE: f64 = 2.0;
const MINORITY_SLOPE: f64 = 3.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Majority,
    Minority,
}

/// Classify a vote. At exactly 50% both directions count as majority.
pub fn classify(vote: bool, yes_percentage: f64) -> Alignment {
    let majority = (vote && yes_percentage >= 50.0) || (!vote && yes_percentage <= 50.0);
    if majority {
        Alignment::Majority
    } else {
        Alignment::Minority
    }
}

/// Points earned for a vote with the given alignment
pub fn earned_points(alignment: Alignment, yes_percentage: f64) -> u64 {
    let majority_pct = yes_percentage.max(100.0 - yes_percentage);
    let minority_pct = yes_percentage.min(100.0 - yes_percentage);
    let points = match alignment {
        Alignment::Majority => ((majority_pct - 50.0) * MAJORITY_SLOPE).floor(),
        Alignment::Minority => ((50.0 - minority_pct) * MINORITY_SLOPE).floor(),
    };
    points.max(0.0) as u64
}

/// Result of scoring one vote
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteScore {
    pub alignment: Alignment,
    pub earned_points: u64,
    pub yes_percentage: f64,
}

impl VisitorStats {
    /// Fold one vote into the running totals and mark the character as seen
    pub fn apply_vote(
        &mut self,
        character_id: CharacterId,
        vote: bool,
        yes_percentage: f64,
    ) -> VoteScore {
        let yes_percentage = yes_percentage.clamp(0.0, 100.0);
        let alignment = classify(vote, yes_percentage);

        if vote {
            self.yes_votes_total += 1;
        } else {
            self.no_votes_total += 1;
        }

        let points = earned_points(alignment, yes_percentage);
        match alignment {
            Alignment::Majority => {
                self.majority_total += 1;
                self.majority_streak += 1;
                self.minority_streak = 0;
                self.majority_points += points;
            }
            Alignment::Minority => {
                self.minority_total += 1;
                self.minority_streak += 1;
                self.majority_streak = 0;
                self.minority_points += points;
            }
        }
        self.last_earned_points = points;
        self.interacted_characters.push(character_id);

        VoteScore {
            alignment,
            earned_points: points,
            yes_percentage,
        }
    }

    /// Skips leave streaks and points alone
    pub fn apply_skip(&mut self, character_id: CharacterId) {
        self.last_earned_points = 0;
        self.skips_total += 1;
        self.interacted_characters.push(character_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> VisitorStats {
        VisitorStats::for_session("sess-test".to_string())
    }

    #[test]
    fn test_tie_is_majority_for_both_sides() {
        assert_eq!(classify(true, 50.0), Alignment::Majority);
        assert_eq!(classify(false, 50.0), Alignment::Majority);
        assert_eq!(earned_points(Alignment::Majority, 50.0), 0);
    }

    #[test]
    fn test_classification_off_tie() {
        assert_eq!(classify(true, 75.0), Alignment::Majority);
        assert_eq!(classify(false, 75.0), Alignment::Minority);
        assert_eq!(classify(true, 10.0), Alignment::Minority);
        assert_eq!(classify(false, 10.0), Alignment::Majority);
    }

    #[test]
    fn test_majority_points_at_75() {
        let mut s = stats();
        let score = s.apply_vote(1, true, 75.0);
        assert_eq!(score.alignment, Alignment::Majority);
        assert_eq!(score.earned_points, 50);
        assert_eq!(s.last_earned_points, 50);
        assert_eq!(s.majority_points, 50);
        assert_eq!(s.minority_points, 0);
    }

    #[test]
    fn test_minority_points_at_90() {
        let mut s = stats();
        let score = s.apply_vote(1, false, 90.0);
        assert_eq!(score.alignment, Alignment::Minority);
        assert_eq!(score.earned_points, 120);
        assert_eq!(s.minority_points, 120);
        assert_eq!(s.no_votes_total, 1);
        assert_eq!(s.minority_total, 1);
    }

    #[test]
    fn test_points_are_floored() {
        // 2 of 3 voted yes: 66.67% -> floor(16.67 * 2) = 33
        let pct = 2.0 / 3.0 * 100.0;
        assert_eq!(earned_points(Alignment::Majority, pct), 33);
        // 1 of 4 voted yes, yes voter is in the minority: (50 - 25) * 3 = 75
        assert_eq!(earned_points(Alignment::Minority, 25.0), 75);
    }

    #[test]
    fn test_first_vote_is_full_majority() {
        // The only vote so far: 100% agree with it
        let mut s = stats();
        let score = s.apply_vote(1, false, 0.0);
        assert_eq!(score.alignment, Alignment::Majority);
        assert_eq!(score.earned_points, 100);
    }

    #[test]
    fn test_streaks() {
        let mut s = stats();
        for id in 0..4 {
            s.apply_vote(id, true, 80.0);
        }
        assert_eq!(s.majority_streak, 4);
        assert_eq!(s.minority_streak, 0);

        s.apply_vote(10, true, 20.0);
        assert_eq!(s.majority_streak, 0);
        assert_eq!(s.minority_streak, 1);
        assert_eq!(s.majority_total, 4);
        assert_eq!(s.minority_total, 1);
        assert_eq!(s.yes_votes_total, 5);
    }

    #[test]
    fn test_skip_leaves_streaks_and_points() {
        let mut s = stats();
        s.apply_vote(1, true, 75.0);
        s.apply_vote(2, false, 90.0);
        let before = s.clone();

        s.apply_skip(3);
        assert_eq!(s.majority_streak, before.majority_streak);
        assert_eq!(s.minority_streak, before.minority_streak);
        assert_eq!(s.majority_points, before.majority_points);
        assert_eq!(s.minority_points, before.minority_points);
        assert_eq!(s.skips_total, 1);
        assert_eq!(s.last_earned_points, 0);
        assert_eq!(s.interacted_characters, vec![1, 2, 3]);
    }
}
