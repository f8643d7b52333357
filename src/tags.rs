//! Tri-state tag filter.
//!
//! Every known tag is neutral, included or excluded. Transitions are pure
//! functions of the current state; rendering is a projection of
//! [`TagFilterState`], never a side effect of a toggle. The human-readable
//! summary and the machine-readable payload are cached and rebuilt lazily
//! after any mutation.

use crate::types::{CandidateFilter, CharacterId, TagName};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TagState {
    #[default]
    Neutral,
    Included,
    Excluded,
}

impl TagState {
    /// Primary action (left click): include, or back to neutral if already included
    pub fn primary_toggle(self) -> Self {
        match self {
            TagState::Included => TagState::Neutral,
            TagState::Neutral | TagState::Excluded => TagState::Included,
        }
    }

    /// Secondary action (right click): exclude, or back to neutral if already excluded
    pub fn secondary_toggle(self) -> Self {
        match self {
            TagState::Excluded => TagState::Neutral,
            TagState::Neutral | TagState::Included => TagState::Excluded,
        }
    }
}

/// Machine-readable form of the current selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectedTags {
    pub included: Vec<TagName>,
    pub excluded: Vec<TagName>,
}

#[derive(Debug, Clone, Default)]
pub struct TagFilterState {
    /// Tag universe in load order, each with exactly one state
    tags: Vec<(TagName, TagState)>,
    index: HashMap<TagName, usize>,
    /// Lowercased text-search term restricting the visible subset
    search_term: String,
    summary: OnceCell<String>,
    payload: OnceCell<String>,
}

impl TagFilterState {
    /// Load a tag universe with every tag neutral. Duplicate names are kept once.
    pub fn new<I, S>(universe: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TagName>,
    {
        let mut state = Self::default();
        for tag in universe {
            let tag = tag.into();
            if state.index.contains_key(&tag) {
                continue;
            }
            state.index.insert(tag.clone(), state.tags.len());
            state.tags.push((tag, TagState::Neutral));
        }
        state
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// State of a known tag
    pub fn state(&self, tag: &str) -> Option<TagState> {
        self.index.get(tag).map(|&i| self.tags[i].1)
    }

    /// Apply the primary toggle. Returns the new state, or None for an unknown tag.
    pub fn primary_toggle(&mut self, tag: &str) -> Option<TagState> {
        let next = self.state(tag)?.primary_toggle();
        self.set(tag, next)
    }

    /// Apply the secondary toggle. Returns the new state, or None for an unknown tag.
    pub fn secondary_toggle(&mut self, tag: &str) -> Option<TagState> {
        let next = self.state(tag)?.secondary_toggle();
        self.set(tag, next)
    }

    pub fn reset(&mut self, tag: &str) -> Option<TagState> {
        self.set(tag, TagState::Neutral)
    }

    /// Every tag back to neutral
    pub fn clear(&mut self) {
        for (_, state) in self.tags.iter_mut() {
            *state = TagState::Neutral;
        }
        self.invalidate();
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Set the text-search filter (case-insensitive substring match)
    pub fn set_search(&mut self, term: &str) {
        self.search_term = term.to_lowercase();
    }

    /// Tags currently passing the text-search filter, in universe order
    pub fn visible(&self) -> Vec<(&str, TagState)> {
        self.tags
            .iter()
            .filter(|(tag, _)| tag.to_lowercase().contains(&self.search_term))
            .map(|(tag, state)| (tag.as_str(), *state))
            .collect()
    }

    /// Apply one state to every visible tag, invalidating derived views once.
    /// Returns how many tags were touched.
    pub fn bulk_apply(&mut self, target: TagState) -> usize {
        let mut touched = 0;
        for (tag, state) in self.tags.iter_mut() {
            if tag.to_lowercase().contains(&self.search_term) {
                *state = target;
                touched += 1;
            }
        }
        self.invalidate();
        touched
    }

    /// (included, excluded) in universe order; disjoint by construction
    pub fn selected(&self) -> SelectedTags {
        let mut selected = SelectedTags::default();
        for (tag, state) in &self.tags {
            match state {
                TagState::Included => selected.included.push(tag.clone()),
                TagState::Excluded => selected.excluded.push(tag.clone()),
                TagState::Neutral => {}
            }
        }
        selected
    }

    /// Build the selector input for this filter and a visitor's seen set
    pub fn candidate_filter(&self, seen: BTreeSet<CharacterId>) -> CandidateFilter {
        let SelectedTags { included, excluded } = self.selected();
        CandidateFilter {
            included: included.into_iter().collect(),
            excluded: excluded.into_iter().collect(),
            seen,
        }
    }

    /// Human-readable description of the active filter
    pub fn summary(&self) -> &str {
        self.summary.get_or_init(|| {
            let SelectedTags { included, excluded } = self.selected();
            let mut parts = Vec::new();
            if !included.is_empty() {
                parts.push(format!("Must include: {}", included.join(", ")));
            }
            if !excluded.is_empty() {
                parts.push(format!("Must exclude: {}", excluded.join(", ")));
            }
            if parts.is_empty() {
                "No filters applied (showing all results)".to_string()
            } else {
                parts.join(" | ")
            }
        })
    }

    /// Pretty-printed JSON of [`SelectedTags`]
    pub fn payload(&self) -> &str {
        self.payload.get_or_init(|| {
            serde_json::to_string_pretty(&self.selected()).unwrap_or_else(|_| "{}".to_string())
        })
    }

    fn set(&mut self, tag: &str, next: TagState) -> Option<TagState> {
        let &i = self.index.get(tag)?;
        self.tags[i].1 = next;
        self.invalidate();
        Some(next)
    }

    fn invalidate(&mut self) {
        self.summary.take();
        self.payload.take();
    }
}
