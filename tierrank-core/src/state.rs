/// Ranking state: per-category ordered id lists plus the item records.
///
/// Pure data and mutation primitives. Order within a list is established only
/// by positional insertion and is never re-sorted.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::RankError;
use crate::policy::ScorePolicy;
use crate::types::{Candidate, Category, ItemId, RankedItem};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankingState {
    items_by_id: HashMap<ItemId, RankedItem>,
    /// Best-first id lists, indexed by `Category::index()`.
    lists: [Vec<ItemId>; 3],
    scores_visible: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    policy: ScorePolicy,
}

impl Default for RankingState {
    fn default() -> Self {
        RankingState::new()
    }
}

impl RankingState {
    pub fn new() -> Self {
        RankingState::with_policy(ScorePolicy::default())
    }

    pub fn with_policy(policy: ScorePolicy) -> Self {
        RankingState {
            items_by_id: HashMap::new(),
            lists: [Vec::new(), Vec::new(), Vec::new()],
            scores_visible: policy.visibility_threshold == 0,
            policy,
        }
    }

    pub fn policy(&self) -> &ScorePolicy {
        &self.policy
    }

    pub fn total_count(&self) -> usize {
        self.items_by_id.len()
    }

    pub fn scores_visible(&self) -> bool {
        self.scores_visible
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items_by_id.contains_key(&id)
    }

    pub fn item(&self, id: ItemId) -> Option<&RankedItem> {
        self.items_by_id.get(&id)
    }

    /// Ids in `category`, best first.
    pub fn list(&self, category: Category) -> &[ItemId] {
        &self.lists[category.index()]
    }

    /// Item records in `category`, best first.
    pub fn items_in(&self, category: Category) -> impl Iterator<Item = &RankedItem> + '_ {
        self.list(category).iter().filter_map(move |id| self.items_by_id.get(id))
    }

    /// Comparison-facing views of `category`, best first.
    pub fn candidates(&self, category: Category) -> Vec<Candidate> {
        self.items_in(category).map(RankedItem::candidate).collect()
    }

    /// Every item in global rank order.
    pub fn ranked(&self) -> impl Iterator<Item = &RankedItem> + '_ {
        Category::ALL.into_iter().flat_map(move |c| self.items_in(c))
    }

    /// Splice a new item into `category` at 0-based `position`, then recompute
    /// scores and global ranks.
    ///
    /// Nothing is modified if an error is returned.
    pub fn insert_at(
        &mut self,
        category: Category,
        position: usize,
        candidate: Candidate,
        added_at: DateTime<Utc>,
    ) -> Result<&RankedItem, RankError> {
        let len = self.list(category).len();
        if position > len {
            return Err(RankError::InvalidPosition { position, len });
        }
        if self.contains(candidate.id) {
            return Err(RankError::DuplicateItem(candidate.id));
        }

        let id = candidate.id;
        let item = RankedItem {
            id,
            title: candidate.title,
            poster_ref: candidate.poster_ref,
            category,
            score: None,
            global_rank: 0,
            added_at,
        };
        self.lists[category.index()].insert(position, id);
        self.items_by_id.insert(id, item);
        debug!(id, %category, position, total = self.total_count(), "inserted item");

        let newly_visible =
            !self.scores_visible && self.total_count() >= self.policy.visibility_threshold;
        if newly_visible {
            self.scores_visible = true;
            debug!(total = self.total_count(), "score visibility threshold reached");
            for c in Category::ALL {
                self.recalculate_scores(c);
            }
        } else {
            self.recalculate_scores(category);
        }
        self.recalculate_global_ranks();

        Ok(&self.items_by_id[&id])
    }

    /// Evenly space scores across `category` from its range max down to min.
    ///
    /// No-op while scores are hidden.
    pub fn recalculate_scores(&mut self, category: Category) {
        if !self.scores_visible {
            return;
        }
        let range = self.policy.range(category);
        let list = &self.lists[category.index()];
        let len = list.len();
        for (i, id) in list.iter().enumerate() {
            if let Some(item) = self.items_by_id.get_mut(id) {
                item.score = Some(range.score_at(i, len));
            }
        }
    }

    /// Assign `global_rank = index + 1` over `liked ++ neutral ++ disliked`.
    pub fn recalculate_global_ranks(&mut self) {
        let mut rank = 0;
        for list in &self.lists {
            for id in list {
                rank += 1;
                if let Some(item) = self.items_by_id.get_mut(id) {
                    item.global_rank = rank;
                }
            }
        }
    }

    /// Check every structural invariant. Intended for state loaded from storage.
    pub fn validate(&self) -> Result<(), RankError> {
        self.policy.validate()?;

        let listed: usize = self.lists.iter().map(Vec::len).sum();
        if listed != self.items_by_id.len() {
            return Err(RankError::InconsistentState(format!(
                "{listed} ids in lists but {} item records",
                self.items_by_id.len()
            )));
        }

        let mut seen = std::collections::HashSet::with_capacity(listed);
        let mut expected_rank = 0;
        for category in Category::ALL {
            for id in self.list(category) {
                if !seen.insert(*id) {
                    return Err(RankError::InconsistentState(format!(
                        "item {id} is listed more than once"
                    )));
                }
                let item = self.items_by_id.get(id).ok_or_else(|| {
                    RankError::InconsistentState(format!("item {id} is listed but has no record"))
                })?;
                if item.category != category {
                    return Err(RankError::InconsistentState(format!(
                        "item {id} is in the {category} list but records category {}",
                        item.category
                    )));
                }
                expected_rank += 1;
                if item.global_rank != expected_rank {
                    return Err(RankError::InconsistentState(format!(
                        "item {id} has global rank {} but sits at {expected_rank}",
                        item.global_rank
                    )));
                }
                if item.score.is_some() != self.scores_visible {
                    return Err(RankError::InconsistentState(format!(
                        "item {id} score presence disagrees with score visibility"
                    )));
                }
            }
        }

        let should_be_visible = self.total_count() >= self.policy.visibility_threshold;
        if self.scores_visible != should_be_visible {
            return Err(RankError::InconsistentState(format!(
                "scores_visible is {} with {} items and threshold {}",
                self.scores_visible,
                self.total_count(),
                self.policy.visibility_threshold
            )));
        }
        Ok(())
    }
}
