//! Verification request route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::error::Result;
use crate::middleware::AdminAccess;
use crate::models::VerificationRequest;
use crate::routes::{ApiJson, ApiQuery};
use crate::services::VerificationService;
use crate::services::verification::{RequestQuery, SubmitRequest};
use crate::state::AppState;

/// `POST /api/verify`
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SubmitRequest>,
) -> Result<(StatusCode, Json<VerificationRequest>)> {
    let request = VerificationService::new(state.store()).submit(body).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /api/verify`
pub async fn list(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RequestQuery>,
) -> Result<Json<Vec<VerificationRequest>>> {
    let requests = VerificationService::new(state.store()).list(query).await?;
    Ok(Json(requests))
}

/// `GET /api/verify/user/{uid}`
pub async fn for_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<VerificationRequest>> {
    let request = VerificationService::new(state.store()).for_user(&uid).await?;
    Ok(Json(request))
}

/// `PATCH /api/verify/{id}/approve`
pub async fn approve(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    VerificationService::new(state.store()).approve(&id).await?;
    Ok(Json(json!({ "message": "User verified successfully" })))
}

/// `PATCH /api/verify/{id}/decline`
pub async fn decline(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    VerificationService::new(state.store()).decline(&id).await?;
    Ok(Json(json!({ "message": "Request declined" })))
}
