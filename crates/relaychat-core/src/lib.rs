//! Business logic and store trait definitions for Relaychat.
//!
//! This crate defines the "ports" (store and provider traits) that the
//! infrastructure layer implements. It depends only on `relaychat-types` --
//! never on `relaychat-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
pub mod usage;

#[cfg(test)]
mod testing;
