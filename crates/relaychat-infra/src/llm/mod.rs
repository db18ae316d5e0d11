//! LLM provider implementations.
//!
//! Concrete implementations of the [`LlmProvider`] trait defined in
//! `relaychat-core`, plus [`build_selector`], which wires the three
//! fallback slots from configuration and environment.
//!
//! [`LlmProvider`]: relaychat_core::llm::provider::LlmProvider

pub mod local;
pub mod openai_compat;

use std::sync::Arc;
use std::time::Duration;

use relaychat_core::llm::box_provider::BoxLlmProvider;
use relaychat_core::llm::selector::{CompletionParams, ModeState, ProviderSelector};
use relaychat_types::config::ProvidersConfig;

use self::local::LocalFallbackProvider;
use self::openai_compat::OpenAiCompatibleProvider;

/// Sampling parameters and timeout from the `[providers]` section.
pub fn completion_params(config: &ProvidersConfig) -> CompletionParams {
    CompletionParams {
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        timeout: Duration::from_secs(config.timeout_secs),
    }
}

/// Build the selector with both remote clients (keys read from the
/// environment) and the offline responder.
///
/// Missing keys are not an error here; the affected provider reports
/// `KeyMissing` when called.
pub fn build_selector(config: &ProvidersConfig) -> ProviderSelector {
    let secondary = OpenAiCompatibleProvider::from_env(&config.secondary);
    let primary = OpenAiCompatibleProvider::from_env(&config.primary);
    let local = LocalFallbackProvider::new(config.local.name.clone());

    tracing::info!(
        initial_mode = %config.initial_mode,
        secondary = %config.secondary.name,
        primary = %config.primary.name,
        "Provider chain configured"
    );

    ProviderSelector::new(
        BoxLlmProvider::new(secondary),
        BoxLlmProvider::new(primary),
        BoxLlmProvider::new(local),
        Arc::new(ModeState::new(config.initial_mode)),
        completion_params(config),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaychat_types::llm::ProviderMode;

    #[test]
    fn test_build_selector_uses_configured_names() {
        let mut config = ProvidersConfig::default();
        config.initial_mode = ProviderMode::Primary;
        config.secondary.api_key_env = "RELAYCHAT_TEST_UNSET_SECONDARY".to_string();
        config.primary.api_key_env = "RELAYCHAT_TEST_UNSET_PRIMARY".to_string();

        let selector = build_selector(&config);
        let info = selector.current_info();
        assert_eq!(info.mode, ProviderMode::Primary);
        assert_eq!(info.name, "OpenAI GPT-4o");
        assert_eq!(selector.info(ProviderMode::Local).name, "Local AI (Fallback)");
    }

    #[tokio::test]
    async fn test_unset_keys_fall_through_to_local() {
        let mut config = ProvidersConfig::default();
        config.secondary.api_key_env = "RELAYCHAT_TEST_UNSET_A".to_string();
        config.primary.api_key_env = "RELAYCHAT_TEST_UNSET_B".to_string();

        let selector = build_selector(&config);
        let messages = relaychat_core::llm::prompt::format_messages("persona", &[]);
        let result = selector.complete(messages).await.unwrap();
        assert!(result.info.is_local);
        assert_eq!(result.info.name, "Local AI (Fallback)");
    }

    #[test]
    fn test_completion_params() {
        let params = completion_params(&ProvidersConfig::default());
        assert_eq!(params.max_tokens, 800);
        assert_eq!(params.timeout, Duration::from_secs(60));
    }
}
