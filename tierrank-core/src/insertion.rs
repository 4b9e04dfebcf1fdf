/// Bounded binary insertion.
///
/// A new item is compared against the current best, then the current worst,
/// then bisected between them. The search is an explicit resumable step machine
/// so a caller waiting on a human can pause between comparisons, persist the
/// progress, or throw it away. `compute_insertion_rank` drives the same machine
/// with an async oracle.
use std::convert::Infallible;

use tracing::debug;

use crate::error::RankError;
use crate::types::{Candidate, Choice, Verdict};

/// Progress of one insertion search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "phase", rename_all = "lowercase"))]
pub enum Phase {
    /// Comparing against the current best.
    Top,
    /// Comparing against the current worst.
    Bottom { lo: usize, hi: usize },
    /// Bisecting the open interval (lo, hi).
    Binary { lo: usize, hi: usize },
    /// Final 0-based insert position.
    Done { position: usize },
}

/// What the machine needs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Ask the oracle to compare the new item against `existing[opponent]`.
    Compare { opponent: usize },
    Done { position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "InsertionRepr"))]
pub struct Insertion {
    /// Length of the category list the search runs over.
    len: usize,
    phase: Phase,
    comparisons: usize,
}

/// Unchecked wire form of `Insertion`; restored through `Insertion::resume`.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct InsertionRepr {
    len: usize,
    phase: Phase,
    #[serde(default)]
    comparisons: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<InsertionRepr> for Insertion {
    type Error = RankError;

    fn try_from(raw: InsertionRepr) -> Result<Self, RankError> {
        let mut machine = Insertion::resume(raw.len, raw.phase)?;
        machine.comparisons = raw.comparisons;
        Ok(machine)
    }
}

impl Insertion {
    /// Start a search over a list of `len` existing items.
    pub fn begin(len: usize) -> Self {
        let phase = if len == 0 { Phase::Done { position: 0 } } else { Phase::Top };
        Insertion {
            len,
            phase,
            comparisons: 0,
        }
    }

    /// Rebuild a machine from a previously observed phase.
    pub fn resume(len: usize, phase: Phase) -> Result<Self, RankError> {
        match phase {
            Phase::Top if len == 0 => return Err(RankError::InvalidBounds { lo: 0, hi: 0, len }),
            Phase::Top => {}
            Phase::Bottom { lo, hi } => {
                if len == 0 || lo != 0 || hi != len - 1 {
                    return Err(RankError::InvalidBounds { lo, hi, len });
                }
            }
            Phase::Binary { lo, hi } => {
                if len < 2 {
                    return Err(RankError::EmptyCategoryMidComparison { len });
                }
                if hi >= len || lo >= hi || hi - lo <= 1 {
                    return Err(RankError::InvalidBounds { lo, hi, len });
                }
            }
            Phase::Done { position } if position > len => {
                return Err(RankError::InvalidPosition { position, len });
            }
            Phase::Done { .. } => {}
        }
        Ok(Insertion {
            len,
            phase,
            comparisons: 0,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Comparison results applied since `begin` or `resume`.
    pub fn comparisons(&self) -> usize {
        self.comparisons
    }

    /// The final 0-based position, once the search has finished.
    pub fn position(&self) -> Option<usize> {
        match self.phase {
            Phase::Done { position } => Some(position),
            _ => None,
        }
    }

    pub fn next_comparison(&self) -> Step {
        match self.phase {
            Phase::Top => Step::Compare { opponent: 0 },
            Phase::Bottom { hi, .. } => Step::Compare { opponent: hi },
            Phase::Binary { lo, hi } => Step::Compare {
                opponent: (lo + hi) / 2,
            },
            Phase::Done { position } => Step::Done { position },
        }
    }

    /// Feed the oracle's answer for the comparison returned by `next_comparison`.
    pub fn apply_comparison_result(&mut self, verdict: Verdict) -> Result<Phase, RankError> {
        match self.phase {
            Phase::Done { .. } => return Err(RankError::InsertionComplete),
            Phase::Binary { .. } if self.len < 2 => {
                return Err(RankError::EmptyCategoryMidComparison { len: self.len });
            }
            _ => {}
        }
        self.advance(verdict);
        Ok(self.phase)
    }

    fn advance(&mut self, verdict: Verdict) {
        let next = match (self.phase, verdict) {
            (Phase::Top, Verdict::NewItem) => Phase::Done { position: 0 },
            (Phase::Top, Verdict::Existing) => Phase::Bottom {
                lo: 0,
                hi: self.len - 1,
            },
            (Phase::Bottom { .. }, Verdict::Existing) => Phase::Done { position: self.len },
            (Phase::Bottom { lo, hi }, Verdict::NewItem) => bisect(lo, hi),
            (Phase::Binary { lo, hi }, verdict) => {
                let mid = (lo + hi) / 2;
                match verdict {
                    Verdict::NewItem => bisect(lo, mid),
                    Verdict::Existing => bisect(mid, hi),
                }
            }
            (done @ Phase::Done { .. }, _) => done,
        };
        self.comparisons += 1;
        debug!(from = ?self.phase, to = ?next, ?verdict, "insertion step");
        self.phase = next;
    }
}

/// Binary phase over (lo, hi), or done at `hi` once nothing lies strictly between.
fn bisect(lo: usize, hi: usize) -> Phase {
    if hi - lo <= 1 {
        Phase::Done { position: hi }
    } else {
        Phase::Binary { lo, hi }
    }
}

/// Upper bound on oracle calls for a list of `n` existing items.
///
/// 0 for an empty list, 2 for a single item, `2 + ceil(log2(n - 1))` otherwise.
pub fn max_comparisons(n: usize) -> usize {
    match n {
        0 => 0,
        1 => 2,
        _ => 2 + (n - 1).next_power_of_two().trailing_zeros() as usize,
    }
}

/// Source of pairwise preferences, normally a person choosing between two options.
///
/// Answers are trusted as given and each pair is asked at most once.
#[allow(async_fn_in_trait)]
pub trait ComparisonOracle {
    /// Raised when no answer will come, e.g. the person walked away.
    type Error;

    async fn prefer(&mut self, first: &Candidate, second: &Candidate) -> Result<Choice, Self::Error>;
}

/// Oracle backed by a synchronous closure.
pub struct FnOracle<F>(F);

/// Wrap a closure `(first, second) -> Choice` as an oracle.
pub fn from_fn<F>(f: F) -> FnOracle<F>
where
    F: FnMut(&Candidate, &Candidate) -> Choice,
{
    FnOracle(f)
}

impl<F> ComparisonOracle for FnOracle<F>
where
    F: FnMut(&Candidate, &Candidate) -> Choice,
{
    type Error = Infallible;

    async fn prefer(&mut self, first: &Candidate, second: &Candidate) -> Result<Choice, Infallible> {
        Ok((self.0)(first, second))
    }
}

/// Find the 1-based rank at which `candidate` belongs in `existing` (best first).
///
/// The oracle is always asked `prefer(candidate, existing_item)`; `Choice::First`
/// means the new item wins. Returns a rank in `1..=existing.len() + 1`.
pub async fn compute_insertion_rank<O>(
    existing: &[Candidate],
    candidate: &Candidate,
    oracle: &mut O,
) -> Result<usize, O::Error>
where
    O: ComparisonOracle,
{
    let mut machine = Insertion::begin(existing.len());
    loop {
        match machine.next_comparison() {
            Step::Done { position } => {
                debug!(
                    id = candidate.id,
                    rank = position + 1,
                    comparisons = machine.comparisons(),
                    "insertion rank found"
                );
                return Ok(position + 1);
            }
            Step::Compare { opponent } => {
                let choice = oracle.prefer(candidate, &existing[opponent]).await?;
                machine.advance(choice.into());
            }
        }
    }
}

impl From<Choice> for Verdict {
    /// Maps an answer to `prefer(new_item, existing_item)`.
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::First => Verdict::NewItem,
            Choice::Second => Verdict::Existing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::future::Future;

    fn list(n: usize) -> Vec<Candidate> {
        (0..n as i64).map(|i| Candidate::new(i, format!("item {i}"))).collect()
    }

    /// Run the machine to completion with a target position, counting comparisons.
    ///
    /// The new item beats every existing item at index >= `target`.
    fn run_to_target(len: usize, target: usize) -> (usize, usize) {
        let mut machine = Insertion::begin(len);
        loop {
            match machine.next_comparison() {
                Step::Done { position } => return (position, machine.comparisons()),
                Step::Compare { opponent } => {
                    let verdict = if opponent >= target { Verdict::NewItem } else { Verdict::Existing };
                    machine.apply_comparison_result(verdict).unwrap();
                }
            }
        }
    }

    fn block_on<F: Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }

    #[test]
    fn test_empty_list_is_done_immediately() {
        let machine = Insertion::begin(0);
        assert_eq!(machine.next_comparison(), Step::Done { position: 0 });
        assert_eq!(machine.comparisons(), 0);
    }

    #[test]
    fn test_top_win_inserts_first() {
        let mut machine = Insertion::begin(8);
        assert_eq!(machine.next_comparison(), Step::Compare { opponent: 0 });
        let phase = machine.apply_comparison_result(Verdict::NewItem).unwrap();
        assert_eq!(phase, Phase::Done { position: 0 });
        assert_eq!(machine.comparisons(), 1);
    }

    #[test]
    fn test_bottom_loss_inserts_last() {
        let mut machine = Insertion::begin(8);
        machine.apply_comparison_result(Verdict::Existing).unwrap();
        assert_eq!(machine.phase(), Phase::Bottom { lo: 0, hi: 7 });
        assert_eq!(machine.next_comparison(), Step::Compare { opponent: 7 });
        machine.apply_comparison_result(Verdict::Existing).unwrap();
        assert_eq!(machine.position(), Some(8));
        assert_eq!(machine.comparisons(), 2);
    }

    #[test]
    fn test_single_item_list_takes_two_comparisons_to_place_below() {
        let (position, comparisons) = run_to_target(1, 1);
        assert_eq!(position, 1);
        assert_eq!(comparisons, 2);
    }

    #[test]
    fn test_single_item_contradiction_trusts_latest_answer() {
        let mut machine = Insertion::begin(1);
        machine.apply_comparison_result(Verdict::Existing).unwrap();
        machine.apply_comparison_result(Verdict::NewItem).unwrap();
        assert_eq!(machine.position(), Some(0));
    }

    #[test]
    fn test_two_item_list_skips_bisection() {
        let mut machine = Insertion::begin(2);
        machine.apply_comparison_result(Verdict::Existing).unwrap();
        let phase = machine.apply_comparison_result(Verdict::NewItem).unwrap();
        assert_eq!(phase, Phase::Done { position: 1 });
    }

    #[test]
    fn test_five_item_scenario_rank_three_in_four_comparisons() {
        let mut machine = Insertion::begin(5);
        let mut asked = Vec::new();
        let answers = [
            Verdict::Existing, // loses to best
            Verdict::NewItem,  // beats worst
            Verdict::NewItem,  // beats index 2
            Verdict::Existing, // loses to index 1
        ];
        for verdict in answers {
            match machine.next_comparison() {
                Step::Compare { opponent } => asked.push(opponent),
                Step::Done { .. } => panic!("finished early"),
            }
            machine.apply_comparison_result(verdict).unwrap();
        }
        assert_eq!(asked, vec![0, 4, 2, 1]);
        assert_eq!(machine.position(), Some(2));
        assert_eq!(machine.comparisons(), 4);
        assert_eq!(max_comparisons(5), 4);
    }

    #[test]
    fn test_apply_after_done_is_rejected() {
        let mut machine = Insertion::begin(0);
        assert_eq!(
            machine.apply_comparison_result(Verdict::NewItem),
            Err(RankError::InsertionComplete)
        );
    }

    #[test]
    fn test_resume_binary_with_too_few_items() {
        let err = Insertion::resume(1, Phase::Binary { lo: 0, hi: 2 }).unwrap_err();
        assert_eq!(err, RankError::EmptyCategoryMidComparison { len: 1 });
    }

    #[test]
    fn test_resume_rejects_bad_bounds() {
        assert!(matches!(
            Insertion::resume(6, Phase::Binary { lo: 2, hi: 9 }),
            Err(RankError::InvalidBounds { .. })
        ));
        assert!(matches!(
            Insertion::resume(6, Phase::Bottom { lo: 0, hi: 3 }),
            Err(RankError::InvalidBounds { .. })
        ));
        assert!(matches!(
            Insertion::resume(5, Phase::Binary { lo: usize::MAX, hi: 1 }),
            Err(RankError::InvalidBounds { .. })
        ));
        assert!(matches!(
            Insertion::resume(9, Phase::Binary { lo: 7, hi: 2 }),
            Err(RankError::InvalidBounds { .. })
        ));
        assert!(matches!(
            Insertion::resume(3, Phase::Done { position: 4 }),
            Err(RankError::InvalidPosition { position: 4, len: 3 })
        ));
    }

    #[test]
    fn test_resume_continues_search() {
        let mut original = Insertion::begin(9);
        original.apply_comparison_result(Verdict::Existing).unwrap();
        original.apply_comparison_result(Verdict::NewItem).unwrap();

        let mut resumed = Insertion::resume(9, original.phase()).unwrap();
        assert_eq!(resumed.next_comparison(), original.next_comparison());
        resumed.apply_comparison_result(Verdict::NewItem).unwrap();
        original.apply_comparison_result(Verdict::NewItem).unwrap();
        assert_eq!(resumed.phase(), original.phase());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_keeps_progress() {
        let mut machine = Insertion::begin(9);
        machine.apply_comparison_result(Verdict::Existing).unwrap();
        machine.apply_comparison_result(Verdict::NewItem).unwrap();

        let json = serde_json::to_string(&machine).unwrap();
        let restored: Insertion = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, machine);
        assert_eq!(restored.comparisons(), 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rejects_corrupt_phase() {
        let inverted = r#"{"len":9,"phase":{"phase":"binary","lo":7,"hi":2},"comparisons":2}"#;
        let err = serde_json::from_str::<Insertion>(inverted).unwrap_err();
        assert!(err.to_string().contains("search bounds lo=7, hi=2"));

        let too_short = r#"{"len":1,"phase":{"phase":"binary","lo":0,"hi":2},"comparisons":2}"#;
        assert!(serde_json::from_str::<Insertion>(too_short).is_err());

        let past_end = r#"{"len":3,"phase":{"phase":"done","position":4},"comparisons":2}"#;
        assert!(serde_json::from_str::<Insertion>(past_end).is_err());
    }

    #[test]
    fn test_max_comparisons() {
        assert_eq!(max_comparisons(0), 0);
        assert_eq!(max_comparisons(1), 2);
        assert_eq!(max_comparisons(2), 2);
        assert_eq!(max_comparisons(3), 3);
        assert_eq!(max_comparisons(5), 4);
        assert_eq!(max_comparisons(9), 5);
        assert_eq!(max_comparisons(10), 6);
    }

    #[test]
    fn test_compute_insertion_rank_scenario() {
        let existing = list(0);
        let mut calls = 0;
        let mut oracle = from_fn(|_: &Candidate, _: &Candidate| {
            calls += 1;
            Choice::First
        });
        let x = Candidate::new(100, "X");
        assert_eq!(block_on(compute_insertion_rank(&existing, &x, &mut oracle)), Ok(1));
        drop(oracle);
        assert_eq!(calls, 0);

        let existing = vec![x];
        let mut calls = 0;
        let mut oracle = from_fn(|_: &Candidate, _: &Candidate| {
            calls += 1;
            Choice::Second
        });
        let y = Candidate::new(101, "Y");
        assert_eq!(block_on(compute_insertion_rank(&existing, &y, &mut oracle)), Ok(2));
        drop(oracle);
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_oracle_sees_new_item_first() {
        let existing = list(3);
        let new_item = Candidate::new(42, "new");
        let mut oracle = from_fn(|first: &Candidate, second: &Candidate| {
            assert_eq!(first.id, 42);
            assert_ne!(second.id, 42);
            Choice::Second
        });
        let rank = compute_insertion_rank(&existing, &new_item, &mut oracle).await;
        assert_eq!(rank, Ok(4));
    }

    struct Walkaway;

    impl ComparisonOracle for Walkaway {
        type Error = &'static str;

        async fn prefer(&mut self, _: &Candidate, _: &Candidate) -> Result<Choice, Self::Error> {
            Err("no answer")
        }
    }

    #[tokio::test]
    async fn test_oracle_error_propagates() {
        let existing = list(4);
        let rank = compute_insertion_rank(&existing, &Candidate::new(9, "x"), &mut Walkaway).await;
        assert_eq!(rank, Err("no answer"));
    }

    proptest! {
        /// Property: comparisons never exceed the bound and the rank is in range.
        #[test]
        fn comparisons_within_bound(n in 0usize..500, seed in any::<u64>()) {
            let mut bits = seed;
            let mut machine = Insertion::begin(n);
            loop {
                match machine.next_comparison() {
                    Step::Done { position } => {
                        prop_assert!(position <= n);
                        break;
                    }
                    Step::Compare { opponent } => {
                        prop_assert!(opponent < n);
                        let verdict = if bits & 1 == 1 { Verdict::NewItem } else { Verdict::Existing };
                        bits = bits.rotate_right(1);
                        machine.apply_comparison_result(verdict).unwrap();
                    }
                }
            }
            prop_assert!(machine.comparisons() <= max_comparisons(n));
        }

        /// Property: a consistent oracle places the item exactly at its target.
        #[test]
        fn consistent_oracle_hits_target(n in 1usize..500, target_frac in 0.0f64..=1.0) {
            let target = ((n as f64) * target_frac).round() as usize;
            let (position, comparisons) = run_to_target(n, target);
            prop_assert_eq!(position, target);
            prop_assert!(comparisons <= max_comparisons(n));
        }

        /// Property: always-win lands first, never-win lands last.
        #[test]
        fn boundary_answers(n in 1usize..500) {
            let existing = list(n);
            let new_item = Candidate::new(-1, "new");

            let mut always = from_fn(|_: &Candidate, _: &Candidate| Choice::First);
            prop_assert_eq!(block_on(compute_insertion_rank(&existing, &new_item, &mut always)), Ok(1));

            let mut never = from_fn(|_: &Candidate, _: &Candidate| Choice::Second);
            prop_assert_eq!(block_on(compute_insertion_rank(&existing, &new_item, &mut never)), Ok(n + 1));
        }
    }
}
