//! Review service.

use std::str::FromStr;

use serde::Deserialize;
use tracing::{info, instrument};

use localbite_core::ReviewId;

use super::non_blank;
use crate::db::{ReviewRepository, Store};
use crate::error::AppError;
use crate::models::review::GUEST_AUTHOR;
use crate::models::{NewReview, RatingInput, Review, ReviewUpdate};

/// Body of `POST /reviews`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    pub cook_name: Option<String>,
    pub user: Option<String>,
    pub email: Option<String>,
    pub rating: Option<RatingInput>,
    pub comment: Option<String>,
}

/// Body of `PUT /reviews/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewEdit {
    pub rating: Option<RatingInput>,
    pub comment: Option<String>,
}

/// Review service.
pub struct ReviewService<'a> {
    store: &'a dyn Store,
}

impl<'a> ReviewService<'a> {
    /// Create a new review service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Record a review. Anonymous reviews are attributed to "Guest".
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if `cookName`, `rating`, or `comment`
    /// is missing, or `rating` is not a number.
    #[instrument(skip(self, input), fields(cook_name = ?input.cook_name))]
    pub async fn create(&self, input: ReviewSubmission) -> Result<Review, AppError> {
        let (Some(cook_name), Some(rating), Some(comment)) = (
            non_blank(input.cook_name),
            input.rating,
            non_blank(input.comment),
        ) else {
            return Err(missing_fields());
        };

        let review = NewReview {
            cook_name,
            user: non_blank(input.user).unwrap_or_else(|| GUEST_AUTHOR.to_owned()),
            email: non_blank(input.email),
            rating: parse_rating(&rating)?,
            comment,
        };

        let review = self.store.create_review(&review).await?;
        info!(review_id = %review.id, cook_name = %review.cook_name, "Review created");
        Ok(review)
    }

    /// Reviews for a cook, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn for_cook(&self, cook_name: &str) -> Result<Vec<Review>, AppError> {
        Ok(self.store.list_reviews_for_cook(cook_name.trim()).await?)
    }

    /// Edit a review's rating and/or comment.
    ///
    /// # Errors
    ///
    /// - `Validation` if `rating` is not a number or `comment` is blank
    /// - `NotFound` if the review does not exist
    #[instrument(skip(self, edit))]
    pub async fn update(&self, raw_id: &str, edit: ReviewEdit) -> Result<Review, AppError> {
        let id = path_review_id(raw_id)?;

        let comment = match edit.comment {
            Some(comment) => Some(
                non_blank(Some(comment))
                    .ok_or_else(|| AppError::Validation("Comment cannot be empty".to_owned()))?,
            ),
            None => None,
        };
        let update = ReviewUpdate {
            rating: edit.rating.as_ref().map(parse_rating).transpose()?,
            comment,
        };

        let review = self
            .store
            .update_review(id, &update)
            .await?
            .ok_or_else(review_not_found)?;

        info!(review_id = %review.id, "Review updated");
        Ok(review)
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the review does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, raw_id: &str) -> Result<(), AppError> {
        let id = path_review_id(raw_id)?;
        if !self.store.delete_review(id).await? {
            return Err(review_not_found());
        }
        info!(review_id = %id, "Review deleted");
        Ok(())
    }
}

fn parse_rating(rating: &RatingInput) -> Result<f64, AppError> {
    rating
        .value()
        .ok_or_else(|| AppError::Validation("Rating must be a number".to_owned()))
}

fn path_review_id(raw: &str) -> Result<ReviewId, AppError> {
    ReviewId::from_str(raw).map_err(|_| review_not_found())
}

fn missing_fields() -> AppError {
    AppError::Validation("Missing fields".to_owned())
}

fn review_not_found() -> AppError {
    AppError::NotFound("Review not found".to_owned())
}
