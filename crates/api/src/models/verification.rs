//! Verification request domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use localbite_core::{Email, Role, Uid, VerificationRequestId, VerificationStatus};

use super::User;

/// A user's request to be marked verified by an admin.
///
/// `full_name`, `email`, and `role` are a snapshot of the user at submission
/// time; later profile edits do not touch them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: VerificationRequestId,
    /// Requesting user. Unique across all requests.
    pub uid: Uid,
    pub full_name: String,
    pub email: Email,
    pub role: Role,
    pub status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot inserted when a request is submitted.
#[derive(Debug, Clone)]
pub struct NewVerificationRequest {
    pub uid: Uid,
    pub full_name: String,
    pub email: Email,
    pub role: Role,
}

impl NewVerificationRequest {
    /// Copy the fields a request records from the user's current profile.
    #[must_use]
    pub fn snapshot(user: &User) -> Self {
        Self {
            uid: user.uid.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
