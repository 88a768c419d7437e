//! Caller identity and the admin gate.
//!
//! Identity comes from the external provider; the frontend forwards the
//! signed-in user's uid in the `x-user-uid` header. When the admin gate is
//! enabled in configuration, admin-only routes require that header to name a
//! user whose role is `admin`. When it is disabled the extractor always
//! succeeds.

use axum::{extract::FromRequestParts, http::request::Parts};

use localbite_core::Uid;

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Header carrying the caller's uid.
pub const CALLER_UID_HEADER: &str = "x-user-uid";

/// Extractor guarding admin-only routes.
///
/// Holds the admin's uid when the gate is enabled, `None` otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn approve(
///     _admin: AdminAccess,
///     Path(id): Path<String>,
/// ) -> Result<impl IntoResponse> {
///     ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AdminAccess(pub Option<Uid>);

impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.config().admin_gate {
            return Ok(Self(None));
        }

        let uid = parts
            .headers
            .get(CALLER_UID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|raw| Uid::parse(raw).ok())
            .ok_or_else(|| AppError::Unauthorized("Sign-in required".to_owned()))?;

        let user = state
            .store()
            .get_user(&uid)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_owned()))?;

        set_sentry_user(&user.uid, Some(user.email.as_str()));

        if !user.role.is_admin() {
            tracing::warn!(uid = %user.uid, role = %user.role, "Admin route refused");
            return Err(AppError::Forbidden("Admin access required".to_owned()));
        }

        Ok(Self(Some(user.uid)))
    }
}
