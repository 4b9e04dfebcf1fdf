use thiserror::Error;

use crate::types::{Category, ItemId};

/// Errors raised by the ranking state and the insertion step machine.
///
/// All of these point at a caller bug or a corrupted persisted state. None of
/// them is raised for a slow or absent oracle answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("insert position {position} is outside 0..={len}")]
    InvalidPosition { position: usize, len: usize },

    /// The bisection phase needs at least two ranked items to bracket against.
    #[error("binary comparison phase reached with only {len} ranked item(s)")]
    EmptyCategoryMidComparison { len: usize },

    #[error("item {0} is already ranked")]
    DuplicateItem(ItemId),

    #[error("insertion already reached its final position")]
    InsertionComplete,

    #[error("insertion still needs comparisons before it can be committed")]
    InsertionIncomplete,

    #[error("search bounds lo={lo}, hi={hi} are invalid for a list of {len}")]
    InvalidBounds { lo: usize, hi: usize, len: usize },

    /// The category list changed between taking the snapshot and committing.
    #[error("{category} list changed while the insertion was in progress")]
    StaleInsertion { category: Category },

    /// Persisted state cannot replace a user's state while one of their insertions runs.
    #[error("an insertion into {category} is still in progress")]
    InsertionInProgress { category: Category },

    #[error("inconsistent ranking state: {0}")]
    InconsistentState(String),

    #[error("invalid score policy: {0}")]
    InvalidPolicy(String),
}

/// Failure of a full rank-and-insert workflow.
#[derive(Debug, Error)]
pub enum InsertError<E> {
    /// The oracle gave up; nothing was inserted.
    #[error("comparison oracle failed: {0}")]
    Oracle(E),

    #[error(transparent)]
    Rank(#[from] RankError),
}
