//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use localbite_core::{Email, Role, Uid};

/// A marketplace user, keyed by the identity provider's `uid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// External identity.
    pub uid: Uid,
    /// Display name.
    pub full_name: String,
    /// Contact email (also used for role lookups).
    pub email: Email,
    /// Marketplace role.
    pub role: Role,
    /// Set by an admin approving a verification request.
    pub is_verified: bool,
    /// Avatar image URL.
    pub avatar: Option<String>,
    /// Free-text location shown on the profile.
    pub location_label: Option<String>,
    /// When the user first signed in.
    pub created_at: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

/// Fields written on sign-in.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub uid: Uid,
    pub full_name: String,
    pub email: Email,
    pub role: Role,
}

/// Profile edit. `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub location_label: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    /// Build an update, treating blank strings as "not provided".
    #[must_use]
    pub fn new(
        full_name: Option<String>,
        location_label: Option<String>,
        avatar: Option<String>,
    ) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        }

        Self {
            full_name: present(full_name),
            location_label: present(location_label),
            avatar: present(avatar),
        }
    }

    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.location_label.is_none() && self.avatar.is_none()
    }

    /// Apply this update to a user record in place.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(full_name) = &self.full_name {
            user.full_name.clone_from(full_name);
        }
        if let Some(location_label) = &self.location_label {
            user.location_label = Some(location_label.clone());
        }
        if let Some(avatar) = &self.avatar {
            user.avatar = Some(avatar.clone());
        }
    }
}

/// Server-side filters for the admin user directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Case-insensitive substring over name and email.
    pub search: Option<String>,
    /// Exact role.
    pub role: Option<Role>,
    /// Exact verification flag.
    pub verified: Option<bool>,
}

impl UserFilter {
    /// The search term, trimmed, if it is non-blank.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Whether a user passes every active filter.
    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        if let Some(term) = self.search_term() {
            let term = term.to_lowercase();
            let hit = user.full_name.to_lowercase().contains(&term)
                || user.email.as_str().to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        if self.role.is_some_and(|role| role != user.role) {
            return false;
        }
        if self.verified.is_some_and(|verified| verified != user.is_verified) {
            return false;
        }
        true
    }
}
