//! User repository.

use async_trait::async_trait;

use localbite_core::{Email, Role, Uid};

use super::postgres::{PgStore, contains_pattern};
use super::RepositoryError;
use crate::models::{NewUser, ProfileUpdate, User, UserFilter};

/// Repository for user documents.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create the user on first sign-in, or refresh `full_name` and `email`
    /// on later sign-ins. Role, verification, and profile extras are kept.
    async fn upsert_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// All users passing `filter`, newest first.
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError>;

    /// Get a user by uid.
    async fn get_user(&self, uid: &Uid) -> Result<Option<User>, RepositoryError>;

    /// Get a user by email (first match if several share it).
    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Apply a profile edit. Returns `None` if the user does not exist.
    async fn update_profile(
        &self,
        uid: &Uid,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError>;

    /// Change a user's role. Returns `None` if the user does not exist.
    async fn set_role(&self, uid: &Uid, role: Role) -> Result<Option<User>, RepositoryError>;

    /// Delete a user. Returns `false` if there was nothing to delete.
    ///
    /// Requests and reviews referencing the user are left in place.
    async fn delete_user(&self, uid: &Uid) -> Result<bool, RepositoryError>;
}

#[async_trait]
impl UserRepository for PgStore {
    async fn upsert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (uid, full_name, email, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (uid) DO UPDATE
                SET full_name = EXCLUDED.full_name,
                    email = EXCLUDED.email,
                    updated_at = NOW()
            RETURNING uid, full_name, email, role, is_verified, avatar, location_label,
                      created_at, updated_at
            ",
        )
        .bind(&user.uid)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(user.role)
        .fetch_one(self.pool())
        .await?;

        Ok(row)
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        let search = filter.search_term().map(contains_pattern);

        let rows = sqlx::query_as::<_, User>(
            r"
            SELECT uid, full_name, email, role, is_verified, avatar, location_label,
                   created_at, updated_at
            FROM users
            WHERE ($1::text IS NULL OR full_name ILIKE $1 OR email ILIKE $1)
              AND ($2::text IS NULL OR role = $2)
              AND ($3::boolean IS NULL OR is_verified = $3)
            ORDER BY created_at DESC
            ",
        )
        .bind(search)
        .bind(filter.role)
        .bind(filter.verified)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    async fn get_user(&self, uid: &Uid) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, User>(
            r"
            SELECT uid, full_name, email, role, is_verified, avatar, location_label,
                   created_at, updated_at
            FROM users
            WHERE uid = $1
            ",
        )
        .bind(uid)
        .fetch_optional(self.pool())
        .await?;

        Ok(row)
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, User>(
            r"
            SELECT uid, full_name, email, role, is_verified, avatar, location_label,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            ORDER BY created_at ASC
            LIMIT 1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        Ok(row)
    }

    async fn update_profile(
        &self,
        uid: &Uid,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, User>(
            r"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                location_label = COALESCE($3, location_label),
                avatar = COALESCE($4, avatar),
                updated_at = NOW()
            WHERE uid = $1
            RETURNING uid, full_name, email, role, is_verified, avatar, location_label,
                      created_at, updated_at
            ",
        )
        .bind(uid)
        .bind(update.full_name.as_deref())
        .bind(update.location_label.as_deref())
        .bind(update.avatar.as_deref())
        .fetch_optional(self.pool())
        .await?;

        Ok(row)
    }

    async fn set_role(&self, uid: &Uid, role: Role) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, User>(
            r"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE uid = $1
            RETURNING uid, full_name, email, role, is_verified, avatar, location_label,
                      created_at, updated_at
            ",
        )
        .bind(uid)
        .bind(role)
        .fetch_optional(self.pool())
        .await?;

        Ok(row)
    }

    async fn delete_user(&self, uid: &Uid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE uid = $1")
            .bind(uid)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
