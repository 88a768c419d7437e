//! Persistence for the LocalBite API.
//!
//! # Collections
//!
//! - `users` - Marketplace users keyed by external `uid`
//! - `verification_requests` - One request per `uid` (unique index)
//! - `reviews` - Free-form reviews keyed loosely by cook display name
//!
//! Collections are related only by denormalized strings; there are no foreign
//! keys and deletes never cascade.
//!
//! # Backends
//!
//! - [`PgStore`] - `PostgreSQL` (production)
//! - [`MemoryStore`] - process-local (development and tests)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p localbite-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;
pub mod reviews;
pub mod users;
pub mod verification_requests;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use reviews::ReviewRepository;
pub use users::UserRepository;
pub use verification_requests::VerificationRepository;

/// Entity names used in [`RepositoryError::NotFound`].
pub mod entity {
    pub const USER: &str = "User";
    pub const REQUEST: &str = "Request";
    pub const REVIEW: &str = "Review";
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A document the operation depends on does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness violation (e.g., second verification request for a uid).
    #[error("{0}")]
    Conflict(String),

    /// The document exists but is not in a state that allows the operation.
    #[error("{0}")]
    InvalidState(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            // A stored role or status this build does not know about
            sqlx::Error::ColumnDecode { index, source } => {
                Self::DataCorruption(format!("column {index}: {source}"))
            }
            other => Self::Database(other),
        }
    }
}

/// Everything the API needs from a backend.
#[async_trait]
pub trait Store: UserRepository + VerificationRepository + ReviewRepository {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Order documents newest first.
///
/// `items` must be in insertion order; documents with equal timestamps keep
/// the most recently inserted first.
pub fn newest_first<T, F>(items: impl DoubleEndedIterator<Item = T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    let mut sorted: Vec<T> = items.rev().collect();
    sorted.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    sorted
}
