//! HTTP routes for the LocalBite API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Readiness (store ping)
//!
//! # Users
//! POST   /users                     - Sign-in upsert
//! GET    /users                     - Directory (admin; ?search&role&verified)
//! POST   /users/bulk-delete         - Delete many (admin)
//! GET    /users/role/{email}        - Role lookup by email
//! GET    /users/{uid}               - Get one
//! PUT    /users/{uid}               - Profile edit
//! DELETE /users/{uid}               - Delete (admin)
//!
//! # Verification requests
//! POST   /api/verify                - Submit
//! GET    /api/verify                - List (admin; ?status)
//! GET    /api/verify/user/{uid}     - The user's own request
//! PATCH  /api/verify/{id}/approve   - Approve (admin)
//! PATCH  /api/verify/{id}/decline   - Decline (admin)
//!
//! # Reviews
//! POST   /reviews                   - Create
//! GET    /reviews/{cook_name}       - List for a cook
//! PUT    /reviews/{id}              - Edit
//! DELETE /reviews/{id}              - Delete
//! ```

pub mod reviews;
pub mod users;
pub mod verification;

use std::time::Duration;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts, State},
    http::{HeaderName, HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    middleware,
    routing::{get, patch, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::db::Store;
use crate::error::AppError;
use crate::middleware::{CALLER_UID_HEADER, request_id_middleware};
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the API error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(users::sign_in).get(users::list))
        .route("/bulk-delete", post(users::bulk_delete))
        .route("/role/{email}", get(users::role_by_email))
        .route(
            "/{uid}",
            get(users::show)
                .put(users::update_profile)
                .delete(users::delete),
        )
}

/// Create the verification request routes router.
pub fn verification_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(verification::submit).get(verification::list))
        .route("/user/{uid}", get(verification::for_user))
        .route("/{id}/approve", patch(verification::approve))
        .route("/{id}/decline", patch(verification::decline))
}

/// Create the review routes router.
///
/// `GET` takes a cook name and `PUT`/`DELETE` take a review id in the same
/// path position, so the segment has one shared name.
pub fn review_routes() -> Router<AppState> {
    Router::new().route("/", post(reviews::create)).route(
        "/{key}",
        get(reviews::for_cook)
            .put(reviews::update)
            .delete(reviews::delete),
    )
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/users", user_routes())
        .nest("/api/verify", verification_routes())
        .nest("/reviews", review_routes())
}

/// Build the application: routes, request IDs, tracing, and CORS.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_origins);

    Router::new()
        .merge(routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(CALLER_UID_HEADER)])
        .max_age(Duration::from_secs(60 * 60))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the store.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store does not answer.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
