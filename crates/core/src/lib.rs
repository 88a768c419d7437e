//! LocalBite Core - Shared domain types.
//!
//! This crate provides the types shared by every LocalBite component:
//! - `api` - REST API consumed by the single-page frontend
//! - `cli` - Command-line tools for migrations, seeding, and user management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Identity, email, role, and verification status types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
