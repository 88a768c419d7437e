//! User service.
//!
//! Sign-in upsert, the admin directory, profile edits, and deletion.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use localbite_core::{Email, Role, Uid};

use super::{non_blank, path_uid};
use crate::db::{Store, UserRepository};
use crate::error::AppError;
use crate::models::{NewUser, ProfileUpdate, User, UserFilter};

/// Body of `POST /users`, sent by the frontend after every sign-in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignIn {
    pub uid: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Body of `PUT /users/:uid`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEdit {
    pub full_name: Option<String>,
    pub location_label: Option<String>,
    pub avatar: Option<String>,
}

/// Query string of `GET /users`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryQuery {
    pub search: Option<String>,
    pub role: Option<String>,
    pub verified: Option<bool>,
}

/// Per-uid result of a bulk delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteOutcome {
    pub deleted: Vec<String>,
    pub not_found: Vec<String>,
}

impl BulkDeleteOutcome {
    /// Whether every requested uid was deleted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.not_found.is_empty()
    }
}

/// User service.
pub struct UserService<'a> {
    store: &'a dyn Store,
}

impl<'a> UserService<'a> {
    /// Create a new user service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Create or refresh the user record for a sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if `uid`, `fullName`, or `email` is
    /// missing or malformed, or `role` is not a known role.
    #[instrument(skip(self, input), fields(uid = ?input.uid))]
    pub async fn sign_in(&self, input: SignIn) -> Result<User, AppError> {
        let (Some(uid), Some(full_name), Some(email)) = (
            non_blank(input.uid),
            non_blank(input.full_name),
            non_blank(input.email),
        ) else {
            return Err(AppError::Validation("Missing fields".to_owned()));
        };

        let uid = Uid::parse(&uid).map_err(|e| AppError::Validation(format!("Invalid uid: {e}")))?;
        let email =
            Email::parse(&email).map_err(|e| AppError::Validation(format!("Invalid email: {e}")))?;
        let role = match non_blank(input.role) {
            Some(role) => role
                .parse::<Role>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
            None => Role::default(),
        };

        let user = self
            .store
            .upsert_user(&NewUser {
                uid,
                full_name,
                email,
                role,
            })
            .await?;

        info!(uid = %user.uid, role = %user.role, "User signed in");
        Ok(user)
    }

    /// List users matching the directory query, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if `role` is not a known role.
    pub async fn list(&self, query: DirectoryQuery) -> Result<Vec<User>, AppError> {
        let role = non_blank(query.role)
            .map(|r| r.parse::<Role>())
            .transpose()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let filter = UserFilter {
            search: query.search,
            role,
            verified: query.verified,
        };
        Ok(self.store.list_users(&filter).await?)
    }

    /// Get a user by the uid in a request path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no such user exists.
    pub async fn get(&self, raw_uid: &str) -> Result<User, AppError> {
        let uid = path_uid(raw_uid)?;
        self.store
            .get_user(&uid)
            .await?
            .ok_or_else(user_not_found)
    }

    /// Look up a user (and so their role) by email.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no user has this email.
    pub async fn by_email(&self, raw_email: &str) -> Result<User, AppError> {
        let email = Email::parse(raw_email).map_err(|_| user_not_found())?;
        self.store
            .get_user_by_email(&email)
            .await?
            .ok_or_else(user_not_found)
    }

    /// Apply a profile edit. Blank fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no such user exists.
    #[instrument(skip(self, edit))]
    pub async fn update_profile(&self, raw_uid: &str, edit: ProfileEdit) -> Result<User, AppError> {
        let uid = path_uid(raw_uid)?;
        let update = ProfileUpdate::new(edit.full_name, edit.location_label, edit.avatar);

        let user = if update.is_empty() {
            self.store.get_user(&uid).await?
        } else {
            self.store.update_profile(&uid, &update).await?
        }
        .ok_or_else(user_not_found)?;

        info!(uid = %user.uid, "Profile updated");
        Ok(user)
    }

    /// Delete one user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no such user exists.
    #[instrument(skip(self))]
    pub async fn delete(&self, raw_uid: &str) -> Result<(), AppError> {
        let uid = path_uid(raw_uid)?;
        if !self.store.delete_user(&uid).await? {
            return Err(user_not_found());
        }
        info!(uid = %uid, "User deleted");
        Ok(())
    }

    /// Delete each uid independently and report which ones existed.
    ///
    /// Earlier deletions are kept if a later one fails.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    #[instrument(skip(self, uids), fields(count = uids.len()))]
    pub async fn bulk_delete(&self, uids: Vec<String>) -> Result<BulkDeleteOutcome, AppError> {
        let mut outcome = BulkDeleteOutcome::default();

        for raw in uids {
            let deleted = match Uid::parse(&raw) {
                Ok(uid) => self.store.delete_user(&uid).await?,
                Err(_) => false,
            };
            if deleted {
                outcome.deleted.push(raw);
            } else {
                outcome.not_found.push(raw);
            }
        }

        if outcome.is_complete() {
            info!(deleted = outcome.deleted.len(), "Users deleted");
        } else {
            warn!(
                deleted = outcome.deleted.len(),
                not_found = outcome.not_found.len(),
                "Bulk delete skipped unknown users"
            );
        }
        Ok(outcome)
    }
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_owned())
}
