//! Review and product records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ReviewError;
use crate::{ProductId, ReviewId, UserId};

/// Lowest rating a reviewer can give.
pub const MIN_RATING: u8 = 1;

/// Highest rating a reviewer can give.
pub const MAX_RATING: u8 = 5;

/// A star rating between [`MIN_RATING`] and [`MAX_RATING`] inclusive.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Create a rating, rejecting values outside `1..=5`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidRating` for out-of-range values.
    pub fn new(value: u8) -> Result<Self, ReviewError> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ReviewError::InvalidRating(i64::from(value)))
        }
    }

    /// Return the numeric value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = ReviewError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for Rating {
    type Error = ReviewError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| ReviewError::InvalidRating(value))
            .and_then(Self::new)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Debug for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rating({})", self.0)
    }
}

/// Who wrote a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "user_id")]
pub enum Author {
    /// A registered user.
    User(UserId),
    /// A visitor who was not signed in.
    Anonymous,
}

impl Author {
    /// Build an author from an optional user id.
    #[must_use]
    pub fn from_user(user_id: Option<UserId>) -> Self {
        user_id.map_or(Self::Anonymous, Self::User)
    }

    /// The user id, if the author is registered.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Anonymous => None,
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// The fields a caller supplies when submitting a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    /// The reviewed product.
    pub product_id: ProductId,
    /// The reviewer.
    pub author: Author,
    /// Optional star rating.
    pub rating: Option<Rating>,
    /// Free-text body.
    pub text: String,
}

/// A stored product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review identifier.
    pub id: ReviewId,
    /// The reviewed product.
    pub product_id: ProductId,
    /// The reviewer.
    pub author: Author,
    /// Optional star rating.
    pub rating: Option<Rating>,
    /// Free-text body.
    pub text: String,
    /// When the review was written.
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Materialize a submission under an allocated id.
    #[must_use]
    pub fn from_new(id: ReviewId, new: NewReview, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            product_id: new.product_id,
            author: new.author,
            rating: new.rating,
            text: new.text,
            created_at,
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
}

impl Product {
    /// Create a product record.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Sort reviews newest first, breaking ties by descending id.
pub fn sort_newest_first(reviews: &mut [Review]) {
    reviews.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
