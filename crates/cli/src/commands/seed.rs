//! Seed the database with users and reviews from a YAML file.
//!
//! ```yaml
//! users:
//!   - uid: cook-amina
//!     fullName: Amina Ben Salah
//!     email: amina@example.com
//!     role: cook
//!     verified: true
//! reviews:
//!   - cookName: Amina Ben Salah
//!     user: Karim
//!     rating: 5
//!     comment: Best couscous in town
//! ```
//!
//! The whole file is validated before connecting. Users are upserted, so
//! re-running a seed is safe; reviews are always inserted.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use localbite_api::db::{ReviewRepository, UserRepository, VerificationRepository};
use localbite_api::models::review::GUEST_AUTHOR;
use localbite_api::models::{NewReview, NewUser};
use localbite_core::{Email, Role, Uid};

/// Top-level seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub reviews: Vec<SeedReview>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
    pub uid: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReview {
    pub cook_name: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub rating: f64,
    pub comment: String,
}

/// Seed data that passed validation.
#[derive(Debug, Default)]
pub struct ValidatedSeed {
    pub users: Vec<(NewUser, bool)>,
    pub reviews: Vec<NewReview>,
}

/// Check every entry, collecting all problems rather than stopping at the first.
///
/// # Errors
///
/// Returns one message per invalid entry.
pub fn validate(seed: SeedFile) -> Result<ValidatedSeed, Vec<String>> {
    let mut errors = Vec::new();
    let mut validated = ValidatedSeed::default();

    for (i, user) in seed.users.into_iter().enumerate() {
        let uid = Uid::parse(&user.uid).map_err(|e| format!("users[{i}].uid: {e}"));
        let email = Email::parse(&user.email).map_err(|e| format!("users[{i}].email: {e}"));
        let role = user
            .role
            .as_deref()
            .map_or(Ok(Role::default()), str::parse::<Role>)
            .map_err(|e| format!("users[{i}].role: {e}"));
        let name = if user.full_name.trim().is_empty() {
            Err(format!("users[{i}].fullName: must not be empty"))
        } else {
            Ok(user.full_name.trim().to_owned())
        };

        match (uid, email, role, name) {
            (Ok(uid), Ok(email), Ok(role), Ok(full_name)) => validated.users.push((
                NewUser {
                    uid,
                    full_name,
                    email,
                    role,
                },
                user.verified,
            )),
            (uid, email, role, name) => errors.extend(
                [uid.err(), email.err(), role.err(), name.err()]
                    .into_iter()
                    .flatten(),
            ),
        }
    }

    for (i, review) in seed.reviews.into_iter().enumerate() {
        if review.cook_name.trim().is_empty() || review.comment.trim().is_empty() {
            errors.push(format!("reviews[{i}]: cookName and comment are required"));
            continue;
        }
        if !review.rating.is_finite() {
            errors.push(format!("reviews[{i}].rating: must be a number"));
            continue;
        }
        validated.reviews.push(NewReview {
            cook_name: review.cook_name.trim().to_owned(),
            user: review
                .user
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| GUEST_AUTHOR.to_owned()),
            email: review.email.filter(|e| !e.trim().is_empty()),
            rating: review.rating,
            comment: review.comment.trim().to_owned(),
        });
    }

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(errors)
    }
}

/// Seed users and reviews from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry is
/// invalid, or database operations fail.
pub async fn from_file(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let seed = match validate(seed) {
        Ok(seed) => seed,
        Err(errors) => {
            error!("Seed validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };

    info!(
        users = seed.users.len(),
        reviews = seed.reviews.len(),
        "Seed file validated"
    );

    let store = super::connect().await?;

    for (user, verified) in &seed.users {
        store.upsert_user(user).await?;
        // Upsert keeps the stored role, so apply the seeded one explicitly
        store.set_role(&user.uid, user.role).await?;
        if *verified {
            store.verify_user(&user.uid).await?;
        }
    }

    for review in &seed.reviews {
        store.create_review(review).await?;
    }

    info!("Seeding complete!");
    info!("  Users upserted: {}", seed.users.len());
    info!("  Reviews inserted: {}", seed.reviews.len());

    Ok(())
}
