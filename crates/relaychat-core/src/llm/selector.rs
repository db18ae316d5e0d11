//! Provider fallback state machine.
//!
//! Routes every completion to the provider bound to the current
//! [`ProviderMode`]. A recognized failure signal (quota exhausted, invalid
//! key, missing key) demotes the process-wide mode one step down
//! `Secondary -> Primary -> Local` and retries within the same request.
//! Any other failure aborts at the current step without demoting.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use relaychat_types::llm::{CompletionRequest, LlmError, Message, ProviderInfo, ProviderMode};

use super::box_provider::BoxLlmProvider;

/// Process-wide provider mode, shared by every request.
///
/// The lock is never held across an await. Demotion is compare-and-set
/// against the mode the caller observed, so two requests failing on the
/// same provider demote exactly one step between them.
#[derive(Debug)]
pub struct ModeState {
    initial: ProviderMode,
    current: RwLock<ProviderMode>,
}

impl ModeState {
    pub fn new(initial: ProviderMode) -> Self {
        Self {
            initial,
            current: RwLock::new(initial),
        }
    }

    pub fn current(&self) -> ProviderMode {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn initial(&self) -> ProviderMode {
        self.initial
    }

    /// Demote one step if the mode is still `observed`.
    ///
    /// Returns the mode in effect afterwards. If another request already
    /// moved the mode, nothing changes and the newer mode is returned.
    pub fn demote_from(&self, observed: ProviderMode) -> ProviderMode {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if *current == observed {
            if let Some(next) = observed.demoted() {
                *current = next;
            }
        }
        *current
    }

    /// Restore the configured initial mode.
    pub fn reset(&self) -> ProviderMode {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = self.initial;
        *current
    }
}

/// Sampling parameters applied to every provider call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout: Duration,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: 800,
            temperature: 0.7,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Reply text plus the provider that produced it.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    pub text: String,
    pub info: ProviderInfo,
}

/// Three-slot provider table indexed by [`ProviderMode`].
pub struct ProviderSelector {
    providers: [BoxLlmProvider; 3],
    mode: Arc<ModeState>,
    params: CompletionParams,
}

impl ProviderSelector {
    pub fn new(
        secondary: BoxLlmProvider,
        primary: BoxLlmProvider,
        local: BoxLlmProvider,
        mode: Arc<ModeState>,
        params: CompletionParams,
    ) -> Self {
        Self {
            providers: [secondary, primary, local],
            mode,
            params,
        }
    }

    pub fn mode_state(&self) -> &Arc<ModeState> {
        &self.mode
    }

    pub fn provider(&self, mode: ProviderMode) -> &BoxLlmProvider {
        &self.providers[mode.index()]
    }

    /// Metadata for `mode`.
    pub fn info(&self, mode: ProviderMode) -> ProviderInfo {
        ProviderInfo {
            mode,
            name: self.provider(mode).name().to_string(),
            is_local: mode.is_local(),
        }
    }

    /// Metadata for the provider currently in effect.
    pub fn current_info(&self) -> ProviderInfo {
        self.info(self.mode.current())
    }

    /// Metadata for every slot in demotion order.
    pub fn chain(&self) -> Vec<ProviderInfo> {
        ProviderMode::ORDER.iter().map(|m| self.info(*m)).collect()
    }

    /// Restore the configured initial mode.
    pub fn reset_mode(&self) -> ProviderInfo {
        let mode = self.mode.reset();
        tracing::info!(%mode, "Provider mode reset");
        self.info(mode)
    }

    /// Complete `messages` with the current provider, demoting on
    /// recognized failure signals.
    pub async fn complete(&self, messages: Vec<Message>) -> Result<SelectionResult, LlmError> {
        let request = CompletionRequest {
            messages,
            max_tokens: self.params.max_tokens,
            temperature: Some(self.params.temperature),
        };

        // One attempt per slot is enough: the mode only ever moves down.
        let mut last_error = None;
        for _ in 0..ProviderMode::ORDER.len() {
            let mode = self.mode.current();
            let provider = self.provider(mode);
            tracing::debug!(%mode, provider = %provider.name(), "Calling provider");

            let outcome =
                match tokio::time::timeout(self.params.timeout, provider.complete(&request)).await {
                    Ok(result) => result,
                    Err(_) => Err(LlmError::Timeout {
                        provider: provider.name().to_string(),
                        secs: self.params.timeout.as_secs(),
                    }),
                };

            let err = match outcome {
                Ok(text) => {
                    return Ok(SelectionResult {
                        text,
                        info: self.info(mode),
                    });
                }
                Err(err) => err,
            };

            if !err.is_recognized_signal() {
                tracing::error!(
                    %mode,
                    provider = %provider.name(),
                    error = %err,
                    "Provider failed, not demoting"
                );
                return Err(err);
            }

            if mode.is_local() {
                tracing::error!(
                    provider = %provider.name(),
                    error = %err,
                    "Local fallback raised a fallback signal"
                );
                return Err(LlmError::Provider {
                    message: format!("local fallback failed: {err}"),
                });
            }

            let next = self.mode.demote_from(mode);
            tracing::warn!(
                from = %mode,
                to = %next,
                provider = %provider.name(),
                error = %err,
                "Provider failed, demoting"
            );
            last_error = Some(err);
        }

        Err(last_error.unwrap_or(LlmError::Provider {
            message: "no provider produced a response".to_string(),
        }))
    }
}
