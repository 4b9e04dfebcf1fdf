/// Default number of ranked items, across all categories, before scores are shown.
///
/// With fewer items the spacing between scores says little, so every score stays
/// `None` until the collection reaches this size. Overridable via `ScorePolicy`.
pub const SCORE_VISIBILITY_THRESHOLD: usize = 10;

/// Score range (max, min) for the `liked` category.
pub const LIKED_RANGE: (f64, f64) = (10.0, 7.0);

/// Score range (max, min) for the `neutral` category.
pub const NEUTRAL_RANGE: (f64, f64) = (6.9, 4.0);

/// Score range (max, min) for the `disliked` category.
pub const DISLIKED_RANGE: (f64, f64) = (3.9, 1.0);

/// Scores are rounded to this many steps per point (one decimal place).
pub const SCORE_PRECISION: f64 = 10.0;
