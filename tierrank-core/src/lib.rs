/// tierrank-core: Pairwise-comparison ranking engine.
///
/// New item → a few "which do you prefer?" questions → position in a tiered list
/// → evenly spaced scores. No IO, no storage, no UI. Bring your own oracle.
///
/// Items live in one of three buckets (`liked`, `neutral`, `disliked`), each an
/// ordered best-first list. Inserting asks the oracle at most
/// `2 + ceil(log2(n - 1))` questions for a bucket of `n` items.
///
/// For an async oracle (an LLM, a UI awaiting a tap) use `compute_insertion_rank`
/// or `RankingRegistry::rank_and_insert` instead of driving the machine by hand.
///
/// # Quick start
///
/// ```rust
/// use chrono::Utc;
/// use tierrank_core::{Candidate, Category, RankingState, Verdict};
///
/// let mut state = RankingState::new();
///
/// // Step-machine form: one comparison at a time, at the caller's pace.
/// for (id, title) in [(1, "Alien"), (2, "Heat")] {
///     let mut pending = state.begin_insertion(Category::Liked, Candidate::new(id, title)).unwrap();
///     while let Some(_cmp) = pending.next_comparison() {
///         // Show the new item and the existing one to a person; here the existing one wins.
///         pending.apply_comparison_result(Verdict::Existing).unwrap();
///     }
///     pending.commit(&mut state, Utc::now()).unwrap();
/// }
/// assert_eq!(state.list(Category::Liked), &[1, 2]);
/// ```

pub mod constants;
pub mod error;
pub mod insertion;
pub mod interactive;
pub mod policy;
pub mod registry;
pub mod state;
pub mod types;

// Re-export primary public API at crate root.
pub use error::{InsertError, RankError};
pub use insertion::{
    ComparisonOracle, FnOracle, Insertion, Phase, Step, compute_insertion_rank, from_fn,
    max_comparisons,
};
pub use interactive::{Comparison, PendingInsertion};
pub use policy::{ScorePolicy, ScoreRange};
pub use registry::{RankingRegistry, UserId};
pub use state::RankingState;
pub use types::{Candidate, Category, Choice, ItemId, ParseCategoryError, RankedItem, Verdict};
