//! Shared domain types for Relaychat.
//!
//! This crate contains the core domain types used across the workspace:
//! identities, chat turns, usage records, LLM request/error shapes, and
//! configuration, plus their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
pub mod usage;
