//! Review route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::error::Result;
use crate::models::Review;
use crate::routes::ApiJson;
use crate::services::ReviewService;
use crate::services::reviews::{ReviewEdit, ReviewSubmission};
use crate::state::AppState;

/// `POST /reviews`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ReviewSubmission>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = ReviewService::new(state.store()).create(body).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// `GET /reviews/{cook_name}`
pub async fn for_cook(
    State(state): State<AppState>,
    Path(cook_name): Path<String>,
) -> Result<Json<Vec<Review>>> {
    let reviews = ReviewService::new(state.store())
        .for_cook(&cook_name)
        .await?;
    Ok(Json(reviews))
}

/// `PUT /reviews/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReviewEdit>,
) -> Result<Json<Review>> {
    let review = ReviewService::new(state.store()).update(&id, body).await?;
    Ok(Json(review))
}

/// `DELETE /reviews/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    ReviewService::new(state.store()).delete(&id).await?;
    Ok(Json(json!({ "message": "Deleted successfully" })))
}
