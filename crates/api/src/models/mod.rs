//! Domain models for the LocalBite API.
//!
//! Each collection has a stored record type (serialized to the camelCase JSON
//! the frontend consumes) plus the input types its repository accepts.

pub mod review;
pub mod user;
pub mod verification;

pub use review::{NewReview, RatingInput, Review, ReviewUpdate};
pub use user::{NewUser, ProfileUpdate, User, UserFilter};
pub use verification::{NewVerificationRequest, VerificationRequest};
