//! HTTP request handlers.

pub mod chat;
pub mod providers;
pub mod usage;
