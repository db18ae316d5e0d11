//! HTTP layer for Relaychat.
//!
//! Axum router with identity resolution, plain JSON bodies and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
