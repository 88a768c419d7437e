//! Core types for LocalBite.
//!
//! This module provides type-safe wrappers for the marketplace domain.

pub mod email;
pub mod id;
pub mod status;
pub mod uid;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
pub use uid::{Uid, UidError};
