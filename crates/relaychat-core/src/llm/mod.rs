//! LLM provider abstractions for Relaychat.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `ProviderSelector`: the Secondary -> Primary -> Local fallback state machine
//! - `prompt`: payload formatting shared by every provider

pub mod box_provider;
pub mod prompt;
pub mod provider;
pub mod selector;
