//! Review domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use localbite_core::ReviewId;

/// Display name recorded when a review is submitted anonymously.
pub const GUEST_AUTHOR: &str = "Guest";

/// A review left for a cook.
///
/// Reviews reference the cook by display name only, and have no owner: any
/// caller with the id may edit or delete one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub cook_name: String,
    /// Author display name.
    #[sqlx(rename = "user_name")]
    pub user: String,
    pub email: Option<String>,
    pub rating: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated review ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub cook_name: String,
    pub user: String,
    pub email: Option<String>,
    pub rating: f64,
    pub comment: String,
}

/// Partial review edit. `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewUpdate {
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

impl ReviewUpdate {
    /// Apply this update to a review in place.
    pub fn apply_to(&self, review: &mut Review) {
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(comment) = &self.comment {
            review.comment.clone_from(comment);
        }
    }
}

/// A rating as submitted by the frontend: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RatingInput {
    Number(f64),
    Text(String),
}

impl RatingInput {
    /// The numeric value, if the input is a finite number.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}
