//! Business logic for the LocalBite API.
//!
//! Handlers parse HTTP input into the payload types defined here and hand
//! them to a service. Services validate, call the store, log the outcome, and
//! return domain records or an [`AppError`](crate::error::AppError).
//!
//! # Services
//!
//! - [`users`] - Sign-in upsert, directory, profile edits, deletion
//! - [`verification`] - Verification request lifecycle
//! - [`reviews`] - Review capture and lookup

pub mod reviews;
pub mod users;
pub mod verification;

pub use reviews::ReviewService;
pub use users::UserService;
pub use verification::VerificationService;

use localbite_core::Uid;

use crate::error::AppError;

/// Parse a uid taken from a path segment.
///
/// A uid that cannot exist is reported the same way as one that does not.
pub(crate) fn path_uid(raw: &str) -> Result<Uid, AppError> {
    Uid::parse(raw).map_err(|_| AppError::NotFound("User not found".to_owned()))
}

/// Trim a string field, treating blank as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
