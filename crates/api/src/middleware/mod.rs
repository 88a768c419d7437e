//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded into the span, echoed in the response)
//! 4. CORS
//!
//! The admin gate is an extractor ([`AdminAccess`]) rather than a layer so it
//! only runs on the routes that name it.

pub mod auth;
pub mod request_id;

pub use auth::{AdminAccess, CALLER_UID_HEADER};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
