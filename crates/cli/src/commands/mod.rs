//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod users;

use localbite_api::db::{self, PgStore};
use secrecy::SecretString;

/// Errors shared by commands that talk to the database.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read the database URL from `LOCALBITE_DATABASE_URL`, falling back to
/// `DATABASE_URL`. Loads `.env` first.
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("LOCALBITE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("LOCALBITE_DATABASE_URL"))
}

/// Connect and wrap the pool in a store.
pub async fn connect() -> Result<PgStore, CommandError> {
    let url = database_url()?;
    let pool = db::create_pool(&url).await?;
    tracing::info!("Connected to database");
    Ok(PgStore::new(pool))
}
