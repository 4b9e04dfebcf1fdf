/// Score ranges and the visibility threshold.
///
/// Scores are assigned per category from a fixed range, so the ranges must not
/// overlap and must be ordered liked > neutral > disliked. That way score order
/// and global rank order always agree even though each category is scored alone.
use crate::constants::{
    DISLIKED_RANGE, LIKED_RANGE, NEUTRAL_RANGE, SCORE_PRECISION, SCORE_VISIBILITY_THRESHOLD,
};
use crate::error::RankError;
use crate::types::Category;

/// Inclusive score range for one category, best item gets `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreRange {
    pub max: f64,
    pub min: f64,
}

impl ScoreRange {
    pub const fn new(max: f64, min: f64) -> Self {
        ScoreRange { max, min }
    }

    /// Score for the item at 0-based `index` in a list of `len` items.
    ///
    /// Evenly spaced from `max` down to `min`, rounded to one decimal.
    /// A single item gets `max`.
    pub fn score_at(&self, index: usize, len: usize) -> f64 {
        if len <= 1 {
            return round_score(self.max);
        }
        let step = (self.max - self.min) / (len - 1) as f64;
        round_score(self.max - index as f64 * step)
    }
}

fn round_score(raw: f64) -> f64 {
    (raw * SCORE_PRECISION).round() / SCORE_PRECISION
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScorePolicy {
    /// Total item count at which scores become visible.
    pub visibility_threshold: usize,
    pub liked: ScoreRange,
    pub neutral: ScoreRange,
    pub disliked: ScoreRange,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        ScorePolicy {
            visibility_threshold: SCORE_VISIBILITY_THRESHOLD,
            liked: ScoreRange::new(LIKED_RANGE.0, LIKED_RANGE.1),
            neutral: ScoreRange::new(NEUTRAL_RANGE.0, NEUTRAL_RANGE.1),
            disliked: ScoreRange::new(DISLIKED_RANGE.0, DISLIKED_RANGE.1),
        }
    }
}

impl ScorePolicy {
    pub fn with_visibility_threshold(mut self, threshold: usize) -> Self {
        self.visibility_threshold = threshold;
        self
    }

    pub fn range(&self, category: Category) -> ScoreRange {
        match category {
            Category::Liked => self.liked,
            Category::Neutral => self.neutral,
            Category::Disliked => self.disliked,
        }
    }

    /// Reject ranges that are inverted, non-finite, or that overlap the next category down.
    pub fn validate(&self) -> Result<(), RankError> {
        for category in Category::ALL {
            let r = self.range(category);
            if !r.max.is_finite() || !r.min.is_finite() || r.max < r.min {
                return Err(RankError::InvalidPolicy(format!(
                    "{category} range [{}, {}] is inverted or not finite",
                    r.min, r.max
                )));
            }
        }
        for pair in Category::ALL.windows(2) {
            let (upper, lower) = (self.range(pair[0]), self.range(pair[1]));
            if upper.min <= lower.max {
                return Err(RankError::InvalidPolicy(format!(
                    "{} range must sit strictly above {} range",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_policy_is_valid() {
        assert!(ScorePolicy::default().validate().is_ok());
        assert_eq!(ScorePolicy::default().visibility_threshold, 10);
    }

    #[test]
    fn test_score_at_endpoints() {
        let r = ScorePolicy::default().liked;
        assert_eq!(r.score_at(0, 4), 10.0);
        assert_eq!(r.score_at(1, 4), 9.0);
        assert_eq!(r.score_at(3, 4), 7.0);
        assert_eq!(r.score_at(0, 1), 10.0);
    }

    #[test]
    fn test_score_at_rounds_to_one_decimal() {
        let r = ScorePolicy::default().neutral;
        // step = 2.9 / 3
        assert_eq!(r.score_at(1, 4), 5.9);
        assert_eq!(r.score_at(2, 4), 5.0);
        assert_eq!(r.score_at(3, 4), 4.0);
    }

    #[test]
    fn test_overlapping_ranges_rejected() {
        let mut policy = ScorePolicy::default();
        policy.neutral = ScoreRange::new(7.5, 4.0);
        let err = policy.validate().unwrap_err();
        assert!(matches!(err, RankError::InvalidPolicy(_)));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut policy = ScorePolicy::default();
        policy.disliked = ScoreRange::new(1.0, 3.9);
        assert!(policy.validate().is_err());
    }

    proptest! {
        /// Property: scores run from max to min in near-even steps.
        #[test]
        fn scores_evenly_spaced(k in 2usize..200, category in prop::sample::select(Category::ALL.to_vec())) {
            let range = ScorePolicy::default().range(category);
            let scores: Vec<f64> = (0..k).map(|i| range.score_at(i, k)).collect();
            let step = (range.max - range.min) / (k - 1) as f64;

            prop_assert_eq!(scores[0], range.max);
            prop_assert_eq!(scores[k - 1], range.min);
            for pair in scores.windows(2) {
                let gap = pair[0] - pair[1];
                prop_assert!(gap >= 0.0);
                prop_assert!((gap - step).abs() <= 0.1 + 1e-9, "gap {} vs step {}", gap, step);
            }
        }
    }
}
