//! Verification request repository.
//!
//! Resolving a request (approve/decline) is a single atomic operation: the
//! request row is locked, its status checked, and every write happens in one
//! transaction. A request can only leave `pending` once, and a verified user
//! never ends up with a declined request.

use async_trait::async_trait;
use sqlx::PgConnection;

use localbite_core::{Uid, VerificationRequestId, VerificationStatus};

use super::postgres::{PgStore, map_unique_violation};
use super::{RepositoryError, entity};
use crate::models::{NewVerificationRequest, User, VerificationRequest};

/// Message reported when a uid already has a request.
pub const DUPLICATE_REQUEST: &str = "Request already submitted";

/// Repository for verification request documents.
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Insert a `pending` request.
    ///
    /// Fails with `Conflict` if any request already exists for the uid. The
    /// check and the insert are one operation.
    async fn create_request(
        &self,
        request: &NewVerificationRequest,
    ) -> Result<VerificationRequest, RepositoryError>;

    /// All requests (optionally only those in `status`), newest first.
    async fn list_requests(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<VerificationRequest>, RepositoryError>;

    /// Get a request by id.
    async fn get_request(
        &self,
        id: VerificationRequestId,
    ) -> Result<Option<VerificationRequest>, RepositoryError>;

    /// Get the request submitted by `uid`, if any.
    async fn get_request_by_uid(
        &self,
        uid: &Uid,
    ) -> Result<Option<VerificationRequest>, RepositoryError>;

    /// Mark the requesting user verified and the request `approved`, atomically.
    ///
    /// # Errors
    ///
    /// - `NotFound(Request)` if the request does not exist
    /// - `InvalidState` if the request is not `pending`
    /// - `NotFound(User)` if the requesting user was deleted
    ///
    /// Nothing is written on error.
    async fn approve_request(
        &self,
        id: VerificationRequestId,
    ) -> Result<VerificationRequest, RepositoryError>;

    /// Mark a `pending` request `declined`.
    ///
    /// # Errors
    ///
    /// - `NotFound(Request)` if the request does not exist
    /// - `InvalidState` if the request is not `pending`, or the requesting
    ///   user is already verified
    async fn decline_request(
        &self,
        id: VerificationRequestId,
    ) -> Result<VerificationRequest, RepositoryError>;

    /// Mark a user verified without going through a request.
    ///
    /// A `pending` request for the user is approved in the same operation.
    ///
    /// # Errors
    ///
    /// - `NotFound(User)` if the user does not exist
    /// - `InvalidState` if the user's request was declined
    ///
    /// Nothing is written on error.
    async fn verify_user(&self, uid: &Uid) -> Result<User, RepositoryError>;
}

/// Check that a request may move to `next`.
pub(crate) fn ensure_transition(
    request: &VerificationRequest,
    next: VerificationStatus,
) -> Result<(), RepositoryError> {
    if request.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(RepositoryError::InvalidState(format!(
            "Request already {}",
            request.status
        )))
    }
}

pub(crate) fn already_verified() -> RepositoryError {
    RepositoryError::InvalidState("User already verified".to_owned())
}

#[async_trait]
impl VerificationRepository for PgStore {
    async fn create_request(
        &self,
        request: &NewVerificationRequest,
    ) -> Result<VerificationRequest, RepositoryError> {
        let row = sqlx::query_as::<_, VerificationRequest>(
            r"
            INSERT INTO verification_requests (id, uid, full_name, email, role, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, uid, full_name, email, role, status, created_at, updated_at
            ",
        )
        .bind(VerificationRequestId::generate())
        .bind(&request.uid)
        .bind(&request.full_name)
        .bind(&request.email)
        .bind(request.role)
        .bind(VerificationStatus::Pending)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_REQUEST))?;

        Ok(row)
    }

    async fn list_requests(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<VerificationRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, VerificationRequest>(
            r"
            SELECT id, uid, full_name, email, role, status, created_at, updated_at
            FROM verification_requests
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            ",
        )
        .bind(status)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    async fn get_request(
        &self,
        id: VerificationRequestId,
    ) -> Result<Option<VerificationRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, VerificationRequest>(
            r"
            SELECT id, uid, full_name, email, role, status, created_at, updated_at
            FROM verification_requests
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row)
    }

    async fn get_request_by_uid(
        &self,
        uid: &Uid,
    ) -> Result<Option<VerificationRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, VerificationRequest>(
            r"
            SELECT id, uid, full_name, email, role, status, created_at, updated_at
            FROM verification_requests
            WHERE uid = $1
            ",
        )
        .bind(uid)
        .fetch_optional(self.pool())
        .await?;

        Ok(row)
    }

    async fn approve_request(
        &self,
        id: VerificationRequestId,
    ) -> Result<VerificationRequest, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let request = lock_request(&mut tx, id).await?;
        ensure_transition(&request, VerificationStatus::Approved)?;

        let updated = sqlx::query(
            r"
            UPDATE users
            SET is_verified = TRUE, updated_at = NOW()
            WHERE uid = $1
            ",
        )
        .bind(&request.uid)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Dropping `tx` rolls back
            return Err(RepositoryError::NotFound(entity::USER));
        }

        let approved = set_status(&mut tx, id, VerificationStatus::Approved).await?;
        tx.commit().await?;

        Ok(approved)
    }

    async fn decline_request(
        &self,
        id: VerificationRequestId,
    ) -> Result<VerificationRequest, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let request = lock_request(&mut tx, id).await?;
        ensure_transition(&request, VerificationStatus::Declined)?;

        let verified: Option<bool> =
            sqlx::query_scalar("SELECT is_verified FROM users WHERE uid = $1 FOR SHARE")
                .bind(&request.uid)
                .fetch_optional(&mut *tx)
                .await?;
        if verified == Some(true) {
            return Err(already_verified());
        }

        let declined = set_status(&mut tx, id, VerificationStatus::Declined).await?;
        tx.commit().await?;

        Ok(declined)
    }

    async fn verify_user(&self, uid: &Uid) -> Result<User, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        // Request before user, the same lock order as approve/decline
        let request = sqlx::query_as::<_, VerificationRequest>(
            r"
            SELECT id, uid, full_name, email, role, status, created_at, updated_at
            FROM verification_requests
            WHERE uid = $1
            FOR UPDATE
            ",
        )
        .bind(uid)
        .fetch_optional(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, User>(
            r"
            UPDATE users
            SET is_verified = TRUE, updated_at = NOW()
            WHERE uid = $1
            RETURNING uid, full_name, email, role, is_verified, avatar, location_label,
                      created_at, updated_at
            ",
        )
        .bind(uid)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound(entity::USER))?;

        if let Some(request) = request.filter(|r| r.status != VerificationStatus::Approved) {
            ensure_transition(&request, VerificationStatus::Approved)?;
            set_status(&mut tx, request.id, VerificationStatus::Approved).await?;
        }

        tx.commit().await?;
        Ok(user)
    }
}

/// Load a request and hold its row lock until the transaction ends.
async fn lock_request(
    conn: &mut PgConnection,
    id: VerificationRequestId,
) -> Result<VerificationRequest, RepositoryError> {
    sqlx::query_as::<_, VerificationRequest>(
        r"
        SELECT id, uid, full_name, email, role, status, created_at, updated_at
        FROM verification_requests
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound(entity::REQUEST))
}

async fn set_status(
    conn: &mut PgConnection,
    id: VerificationRequestId,
    status: VerificationStatus,
) -> Result<VerificationRequest, RepositoryError> {
    let row = sqlx::query_as::<_, VerificationRequest>(
        r"
        UPDATE verification_requests
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, uid, full_name, email, role, status, created_at, updated_at
        ",
    )
    .bind(id)
    .bind(status)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}
