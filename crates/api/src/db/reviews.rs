//! Review repository.

use async_trait::async_trait;

use localbite_core::ReviewId;

use super::RepositoryError;
use super::postgres::PgStore;
use crate::models::{NewReview, Review, ReviewUpdate};

/// Repository for review documents.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert a review.
    async fn create_review(&self, review: &NewReview) -> Result<Review, RepositoryError>;

    /// Reviews whose cook name equals `cook_name` ignoring case, newest first.
    ///
    /// The name is compared literally; it is never treated as a pattern.
    async fn list_reviews_for_cook(&self, cook_name: &str) -> Result<Vec<Review>, RepositoryError>;

    /// Apply a partial edit. Returns `None` if the review does not exist.
    async fn update_review(
        &self,
        id: ReviewId,
        update: &ReviewUpdate,
    ) -> Result<Option<Review>, RepositoryError>;

    /// Delete a review. Returns `false` if there was nothing to delete.
    async fn delete_review(&self, id: ReviewId) -> Result<bool, RepositoryError>;
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn create_review(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, Review>(
            r"
            INSERT INTO reviews (id, cook_name, user_name, email, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, cook_name, user_name, email, rating, comment, created_at, updated_at
            ",
        )
        .bind(ReviewId::generate())
        .bind(&review.cook_name)
        .bind(&review.user)
        .bind(review.email.as_deref())
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(self.pool())
        .await?;

        Ok(row)
    }

    async fn list_reviews_for_cook(&self, cook_name: &str) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, Review>(
            r"
            SELECT id, cook_name, user_name, email, rating, comment, created_at, updated_at
            FROM reviews
            WHERE lower(cook_name) = lower($1)
            ORDER BY created_at DESC
            ",
        )
        .bind(cook_name)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    async fn update_review(
        &self,
        id: ReviewId,
        update: &ReviewUpdate,
    ) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, Review>(
            r"
            UPDATE reviews
            SET rating = COALESCE($2, rating),
                comment = COALESCE($3, comment),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, cook_name, user_name, email, rating, comment, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(update.rating)
        .bind(update.comment.as_deref())
        .fetch_optional(self.pool())
        .await?;

        Ok(row)
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
