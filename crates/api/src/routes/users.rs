//! User route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::Result;
use crate::middleware::AdminAccess;
use crate::routes::{ApiJson, ApiQuery};
use crate::services::UserService;
use crate::services::users::{DirectoryQuery, ProfileEdit, SignIn};
use crate::state::AppState;

/// Body of `POST /users/bulk-delete`.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteBody {
    pub uids: Vec<String>,
}

/// `POST /users`
pub async fn sign_in(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignIn>,
) -> Result<Json<Value>> {
    let user = UserService::new(state.store()).sign_in(body).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

/// `GET /users`
pub async fn list(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DirectoryQuery>,
) -> Result<Json<Value>> {
    let users = UserService::new(state.store()).list(query).await?;
    Ok(Json(json!({ "success": true, "users": users })))
}

/// `GET /users/{uid}`
pub async fn show(State(state): State<AppState>, Path(uid): Path<String>) -> Result<Json<Value>> {
    let user = UserService::new(state.store()).get(&uid).await?;
    Ok(Json(json!({ "users": user })))
}

/// `GET /users/role/{email}`
pub async fn role_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Value>> {
    let user = UserService::new(state.store()).by_email(&email).await?;
    Ok(Json(json!({ "success": true, "role": user.role, "user": user })))
}

/// `PUT /users/{uid}`
pub async fn update_profile(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    ApiJson(body): ApiJson<ProfileEdit>,
) -> Result<Json<Value>> {
    let user = UserService::new(state.store())
        .update_profile(&uid, body)
        .await?;
    Ok(Json(json!({ "success": true, "users": user })))
}

/// `DELETE /users/{uid}`
pub async fn delete(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<Value>> {
    UserService::new(state.store()).delete(&uid).await?;
    Ok(Json(json!({ "success": true, "message": "User deleted" })))
}

/// `POST /users/bulk-delete`
pub async fn bulk_delete(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<BulkDeleteBody>,
) -> Result<Json<Value>> {
    let outcome = UserService::new(state.store())
        .bulk_delete(body.uids)
        .await?;
    Ok(Json(json!({
        "success": outcome.is_complete(),
        "deleted": outcome.deleted,
        "notFound": outcome.not_found,
    })))
}
