//! User management commands.

use localbite_api::db::{UserRepository, VerificationRepository};
use localbite_core::{Role, Uid};

/// Change a user's role.
///
/// # Errors
///
/// Returns an error if the uid or role is invalid, the user does not exist,
/// or the database fails.
pub async fn set_role(uid: &str, role: &str) -> Result<(), Box<dyn std::error::Error>> {
    let uid = Uid::parse(uid)?;
    let role: Role = role.parse()?;

    let store = super::connect().await?;
    let user = store
        .set_role(&uid, role)
        .await?
        .ok_or_else(|| format!("User not found: {uid}"))?;

    tracing::info!(uid = %user.uid, role = %user.role, "Role updated");
    Ok(())
}

/// Mark a user verified without waiting for a request.
///
/// A pending request for the user is approved along the way.
///
/// # Errors
///
/// Returns an error if the uid is invalid, the user does not exist, the
/// user's request was declined, or the database fails.
pub async fn verify(uid: &str) -> Result<(), Box<dyn std::error::Error>> {
    let uid = Uid::parse(uid)?;

    let store = super::connect().await?;
    let user = store.verify_user(&uid).await?;

    tracing::info!(uid = %user.uid, "User verified");
    Ok(())
}
