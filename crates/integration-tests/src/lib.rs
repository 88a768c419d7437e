//! Integration tests for LocalBite.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p localbite-integration-tests
//!
//! # Include the PostgreSQL-backed tests
//! LOCALBITE_TEST_DATABASE_URL=postgres://... \
//!     cargo test -p localbite-integration-tests -- --include-ignored
//! ```
//!
//! Most tests drive the full router in-process over the in-memory store, so
//! they need no running services. [`TestApp`] wraps that router.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use localbite_api::config::ApiConfig;
use localbite_api::db::{MemoryStore, Store};
use localbite_api::middleware::CALLER_UID_HEADER;
use localbite_api::{AppState, app};

/// A response reduced to what tests assert on.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// The API router over a fresh store.
pub struct TestApp {
    router: Router,
    store: Arc<dyn Store>,
    caller: Option<String>,
}

impl TestApp {
    /// API over an empty in-memory store with the admin gate off.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ApiConfig::in_memory())
    }

    /// API over an empty in-memory store with the admin gate on.
    #[must_use]
    pub fn with_admin_gate() -> Self {
        Self::with_config(ApiConfig {
            admin_gate: true,
            ..ApiConfig::in_memory()
        })
    }

    fn with_config(config: ApiConfig) -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let router = app(AppState::new(config, Arc::clone(&store)));
        Self {
            router,
            store,
            caller: None,
        }
    }

    /// Send subsequent requests as `uid` (via `x-user-uid`).
    #[must_use]
    pub fn as_caller(mut self, uid: &str) -> Self {
        self.caller = Some(uid.to_owned());
        self
    }

    /// Direct access to the backing store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Send a request and decode the JSON body (`Value::Null` if not JSON).
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(uid) = &self.caller {
            builder = builder.header(CALLER_UID_HEADER, uid);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("valid request"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str) -> TestResponse {
        self.send(Method::PATCH, uri, None).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    /// Sign a user in through the API and return the stored record.
    ///
    /// # Panics
    ///
    /// Panics if sign-in does not succeed.
    pub async fn sign_in(&self, uid: &str, full_name: &str, role: Option<&str>) -> Value {
        let mut body = serde_json::json!({
            "uid": uid,
            "fullName": full_name,
            "email": format!("{uid}@example.com"),
        });
        if let Some(role) = role {
            body["role"] = Value::from(role);
        }
        let response = self.post("/users", body).await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["user"].clone()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
