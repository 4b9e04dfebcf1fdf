/// Externally paced insertion.
///
/// `PendingInsertion` binds the step machine to a snapshot of one category so
/// the caller can hand out one comparison at a time, wait as long as it likes,
/// and commit when the search is done. Dropping it at any point is a clean
/// cancel: the ranking state is only touched by `commit`.
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::RankError;
use crate::insertion::{Insertion, Phase, Step, max_comparisons};
use crate::state::RankingState;
use crate::types::{Candidate, Category, RankedItem, Verdict};

/// One comparison the caller should put to the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison<'a> {
    pub new_item: &'a Candidate,
    pub existing: &'a Candidate,
    /// 1-based number of this comparison within the insertion.
    pub number: usize,
    /// Most comparisons this insertion can take.
    pub at_most: usize,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PendingRepr"))]
pub struct PendingInsertion {
    category: Category,
    candidate: Candidate,
    existing: Vec<Candidate>,
    machine: Insertion,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct PendingRepr {
    category: Category,
    candidate: Candidate,
    existing: Vec<Candidate>,
    machine: Insertion,
}

#[cfg(feature = "serde")]
impl TryFrom<PendingRepr> for PendingInsertion {
    type Error = RankError;

    fn try_from(raw: PendingRepr) -> Result<Self, RankError> {
        if raw.machine.len() != raw.existing.len() {
            return Err(RankError::InconsistentState(format!(
                "insertion searches {} items but its snapshot holds {}",
                raw.machine.len(),
                raw.existing.len()
            )));
        }
        if raw.existing.iter().any(|c| c.id == raw.candidate.id) {
            return Err(RankError::DuplicateItem(raw.candidate.id));
        }
        Ok(PendingInsertion {
            category: raw.category,
            candidate: raw.candidate,
            existing: raw.existing,
            machine: raw.machine,
        })
    }
}

impl RankingState {
    /// Start ranking `candidate` into `category`.
    pub fn begin_insertion(
        &self,
        category: Category,
        candidate: Candidate,
    ) -> Result<PendingInsertion, RankError> {
        if self.contains(candidate.id) {
            return Err(RankError::DuplicateItem(candidate.id));
        }
        let existing = self.candidates(category);
        debug!(id = candidate.id, %category, existing = existing.len(), "insertion started");
        Ok(PendingInsertion {
            category,
            machine: Insertion::begin(existing.len()),
            candidate,
            existing,
        })
    }
}

impl PendingInsertion {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    /// The next pair to show, or `None` once the position is known.
    pub fn next_comparison(&self) -> Option<Comparison<'_>> {
        match self.machine.next_comparison() {
            Step::Done { .. } => None,
            Step::Compare { opponent } => Some(Comparison {
                new_item: &self.candidate,
                existing: &self.existing[opponent],
                number: self.machine.comparisons() + 1,
                at_most: max_comparisons(self.existing.len()),
            }),
        }
    }

    pub fn apply_comparison_result(&mut self, verdict: Verdict) -> Result<Phase, RankError> {
        self.machine.apply_comparison_result(verdict)
    }

    pub fn comparisons(&self) -> usize {
        self.machine.comparisons()
    }

    /// 1-based rank within the category, once decided.
    pub fn rank(&self) -> Option<usize> {
        self.machine.position().map(|p| p + 1)
    }

    /// Insert into `state` at the decided position.
    ///
    /// Fails with `StaleInsertion` if the category no longer matches the snapshot
    /// this insertion searched over.
    pub fn commit(
        self,
        state: &mut RankingState,
        added_at: DateTime<Utc>,
    ) -> Result<&RankedItem, RankError> {
        let position = self.machine.position().ok_or(RankError::InsertionIncomplete)?;
        let current = state.list(self.category);
        let unchanged = current.len() == self.existing.len()
            && current.iter().zip(&self.existing).all(|(id, c)| *id == c.id);
        if !unchanged {
            return Err(RankError::StaleInsertion {
                category: self.category,
            });
        }
        debug!(
            id = self.candidate.id,
            category = %self.category,
            rank = position + 1,
            comparisons = self.machine.comparisons(),
            "insertion committed"
        );
        state.insert_at(self.category, position, self.candidate, added_at)
    }
}
