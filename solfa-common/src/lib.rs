//! # Solfa Common Library
//!
//! Shared code for the Solfa catalog services including:
//! - Common error types
//! - Sync event vocabulary (SyncEvent enum)
//! - SSE framing helpers

pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
