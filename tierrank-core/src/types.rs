use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Caller-provided item identifier.
pub type ItemId = i64;

/// One of the three fixed buckets an item is placed in before ranking.
///
/// Variants are declared best-first; global ranks concatenate the buckets in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Category {
    Liked,
    Neutral,
    Disliked,
}

impl Category {
    /// All categories, in global rank order.
    pub const ALL: [Category; 3] = [Category::Liked, Category::Neutral, Category::Disliked];

    pub(crate) fn index(self) -> usize {
        match self {
            Category::Liked => 0,
            Category::Neutral => 1,
            Category::Disliked => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Liked => "liked",
            Category::Neutral => "neutral",
            Category::Disliked => "disliked",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category \"{0}\", expected liked, neutral or disliked")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "liked" => Ok(Category::Liked),
            "neutral" => Ok(Category::Neutral),
            "disliked" => Ok(Category::Disliked),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

/// What the oracle is shown for one side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
    pub id: ItemId,
    /// Display label. Never used for ordering.
    pub title: String,
    /// Optional artwork reference, passed through to the oracle untouched.
    pub poster_ref: Option<String>,
}

impl Candidate {
    pub fn new(id: ItemId, title: impl Into<String>) -> Self {
        Candidate {
            id,
            title: title.into(),
            poster_ref: None,
        }
    }

    pub fn with_poster(mut self, poster_ref: impl Into<String>) -> Self {
        self.poster_ref = Some(poster_ref.into());
        self
    }
}

/// An item that has been placed in a category list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedItem {
    pub id: ItemId,
    pub title: String,
    pub poster_ref: Option<String>,
    pub category: Category,
    /// `None` until the collection reaches the visibility threshold.
    pub score: Option<f64>,
    /// 1-based position across `liked ++ neutral ++ disliked`.
    pub global_rank: usize,
    pub added_at: DateTime<Utc>,
}

impl RankedItem {
    /// The comparison-facing view of this item.
    pub fn candidate(&self) -> Candidate {
        Candidate {
            id: self.id,
            title: self.title.clone(),
            poster_ref: self.poster_ref.clone(),
        }
    }
}

/// Which of the two records handed to the oracle was preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Choice {
    First,
    Second,
}

/// Outcome of one comparison, from the step machine's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    /// The item being inserted was preferred.
    NewItem,
    /// The already-ranked item was preferred.
    Existing,
}
