//! LlmProvider trait definition.
//!
//! This is the core abstraction that all LLM providers implement.

use relaychat_types::llm::{CompletionRequest, LlmError};

/// Trait for LLM provider backends (remote OpenAI-compatible APIs, the
/// offline responder).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in relaychat-infra.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "DeepSeek AI").
    fn name(&self) -> &str;

    /// Send the formatted conversation and receive the reply text.
    ///
    /// Fails with one of the recognized fallback signals
    /// (`QuotaExceeded`, `KeyInvalid`, `KeyMissing`) or any other `LlmError`.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;
}
