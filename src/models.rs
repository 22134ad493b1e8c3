//! Domain models shared by the controller, the storage adapter and the TUI.
//! The types stay light-weight data holders; ordering, uniqueness and
//! persistence decisions live in the controller so every layer sees the same
//! rules.

use std::fmt;

use thiserror::Error;

/// Separator between the name and the rating in the persisted form.
pub const DELIMITER: &str = "||";
/// Lowest rating a child can have (very naughty).
pub const MIN_RATING: i64 = 1;
/// Highest rating a child can have (very nice).
pub const MAX_RATING: i64 = 100;
/// Rating assigned to a freshly added child.
pub const DEFAULT_RATING: i64 = 50;

/// Why a persisted entry could not be turned back into a [`Child`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("entry {0:?} is missing the `||` delimiter")]
    MissingDelimiter(String),
    #[error("entry {0:?} has a blank name")]
    BlankName(String),
    #[error("entry {entry:?} has a non-numeric rating {rating:?}")]
    InvalidRating { entry: String, rating: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One child on the list together with the current naughty/nice rating.
pub struct Child {
    /// Display name, also the identity of the record within a collection.
    pub name: String,
    /// Rating in `MIN_RATING..=MAX_RATING`. Lower is naughtier.
    pub rating: i64,
}

impl Child {
    /// Create a child with the default rating.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_rating(name, DEFAULT_RATING)
    }

    pub fn with_rating(name: impl Into<String>, rating: i64) -> Self {
        Self {
            name: name.into(),
            rating,
        }
    }

    /// Encode the record as `name||rating`, the element format of the
    /// persisted string set.
    pub fn serialized(&self) -> String {
        format!("{}{DELIMITER}{}", self.name, self.rating)
    }

    /// Parse an element written by [`Child::serialized`].
    ///
    /// The split happens on the last delimiter so the rating is always the
    /// trailing segment. Surrounding whitespace is dropped from the name.
    /// Ratings outside the valid range are clamped rather than rejected
    /// since older entries may predate the bounds.
    pub fn from_serialized(entry: &str) -> Result<Self, RecordError> {
        let (name, rating) = entry
            .rsplit_once(DELIMITER)
            .ok_or_else(|| RecordError::MissingDelimiter(entry.to_string()))?;

        if name.trim().is_empty() {
            return Err(RecordError::BlankName(entry.to_string()));
        }

        let rating = rating
            .trim()
            .parse::<i64>()
            .map_err(|_| RecordError::InvalidRating {
                entry: entry.to_string(),
                rating: rating.to_string(),
            })?;

        Ok(Self::with_rating(
            name.trim(),
            rating.clamp(MIN_RATING, MAX_RATING),
        ))
    }
}

impl fmt::Display for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Convert a raw slider/keyboard value into a stored rating: round to the
/// nearest integer, then clamp into the valid range. NaN becomes the minimum.
pub fn clamp_rating(value: f64) -> i64 {
    if value.is_nan() {
        return MIN_RATING;
    }
    let rounded = value.round();
    if rounded <= MIN_RATING as f64 {
        MIN_RATING
    } else if rounded >= MAX_RATING as f64 {
        MAX_RATING
    } else {
        rounded as i64
    }
}
