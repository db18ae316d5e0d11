//! Infrastructure layer for Relaychat.
//!
//! Contains implementations of the store and provider traits defined in
//! `relaychat-core`: SQLite storage for authenticated users, in-process
//! stores for anonymous sessions, OpenAI-compatible provider clients, the
//! offline fallback responder, and the configuration loader.

pub mod config;
pub mod llm;
pub mod session;
pub mod sqlite;
