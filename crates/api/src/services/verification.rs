//! Verification request service.
//!
//! A user submits at most one request; an admin approves or declines it.
//! Approval and the user's `isVerified` flag are written together by the
//! store, so a request is never `approved` for an unverified user.

use std::str::FromStr;

use serde::Deserialize;
use tracing::{info, instrument};

use localbite_core::{Uid, VerificationRequestId, VerificationStatus};

use super::{non_blank, path_uid};
use crate::db::{Store, UserRepository, VerificationRepository};
use crate::error::AppError;
use crate::models::{NewVerificationRequest, VerificationRequest};

/// Body of `POST /api/verify`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    pub uid: Option<String>,
}

/// Query string of `GET /api/verify`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestQuery {
    pub status: Option<String>,
}

/// Verification request service.
pub struct VerificationService<'a> {
    store: &'a dyn Store,
}

impl<'a> VerificationService<'a> {
    /// Create a new verification service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Submit a request for `uid`, snapshotting the user's current profile.
    ///
    /// # Errors
    ///
    /// - `Validation` if `uid` is missing or malformed
    /// - `NotFound` if the user does not exist
    /// - `InvalidState` if the user is already verified
    /// - `Conflict` if the user already has a request (in any state)
    #[instrument(skip(self, input), fields(uid = ?input.uid))]
    pub async fn submit(&self, input: SubmitRequest) -> Result<VerificationRequest, AppError> {
        let uid = non_blank(input.uid)
            .ok_or_else(|| AppError::Validation("uid is required".to_owned()))?;
        let uid = Uid::parse(&uid).map_err(|e| AppError::Validation(format!("Invalid uid: {e}")))?;

        let user = self
            .store
            .get_user(&uid)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

        if user.is_verified {
            return Err(AppError::InvalidState("User already verified".to_owned()));
        }

        let request = self
            .store
            .create_request(&NewVerificationRequest::snapshot(&user))
            .await?;

        info!(request_id = %request.id, uid = %request.uid, "Verification requested");
        Ok(request)
    }

    /// All requests, newest first, optionally only those with one status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if `status` is not a known status.
    pub async fn list(&self, query: RequestQuery) -> Result<Vec<VerificationRequest>, AppError> {
        let status = non_blank(query.status)
            .map(|s| s.parse::<VerificationStatus>())
            .transpose()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok(self.store.list_requests(status).await?)
    }

    /// The request submitted by a user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user has not submitted one.
    pub async fn for_user(&self, raw_uid: &str) -> Result<VerificationRequest, AppError> {
        let uid = path_uid(raw_uid)?;
        self.store
            .get_request_by_uid(&uid)
            .await?
            .ok_or_else(request_not_found)
    }

    /// Approve a pending request and verify its user.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request or its user does not exist
    /// - `InvalidState` if the request was already resolved
    #[instrument(skip(self))]
    pub async fn approve(&self, raw_id: &str) -> Result<VerificationRequest, AppError> {
        let id = path_request_id(raw_id)?;
        let request = self.store.approve_request(id).await?;
        info!(request_id = %request.id, uid = %request.uid, "User verified");
        Ok(request)
    }

    /// Decline a pending request.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request does not exist
    /// - `InvalidState` if the request was already resolved
    #[instrument(skip(self))]
    pub async fn decline(&self, raw_id: &str) -> Result<VerificationRequest, AppError> {
        let id = path_request_id(raw_id)?;
        let request = self.store.decline_request(id).await?;
        info!(request_id = %request.id, uid = %request.uid, "Verification declined");
        Ok(request)
    }
}

fn path_request_id(raw: &str) -> Result<VerificationRequestId, AppError> {
    VerificationRequestId::from_str(raw).map_err(|_| request_not_found())
}

fn request_not_found() -> AppError {
    AppError::NotFound("Request not found".to_owned())
}
