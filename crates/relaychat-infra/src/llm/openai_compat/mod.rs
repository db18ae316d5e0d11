//! OpenAI-compatible LLM provider implementation.
//!
//! A single [`OpenAiCompatibleProvider`] serves both remote slots (OpenAI
//! and DeepSeek speak the same chat completions protocol) via configurable
//! base URLs. Uses [`async_openai`] for request/response handling.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use secrecy::{ExposeSecret, SecretString};

use relaychat_core::llm::provider::LlmProvider;
use relaychat_types::config::RemoteProviderConfig;
use relaychat_types::llm::{CompletionRequest, LlmError, MessageRole};

/// Returned when the provider answers with no content.
pub const EMPTY_COMPLETION_REPLY: &str = "I'm sorry, I couldn't generate a response.";

/// Provider for any OpenAI-compatible API.
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiCompatibleProvider {
    /// `None` when no API key is configured; every call then fails with
    /// `KeyMissing` so the selector can demote.
    client: Option<Client<OpenAIConfig>>,
    provider_name: String,
    model: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: &RemoteProviderConfig, api_key: Option<SecretString>) -> Self {
        let client = api_key.map(|key| {
            let openai_config = OpenAIConfig::new()
                .with_api_key(key.expose_secret())
                .with_api_base(&config.base_url);
            Client::with_config(openai_config)
        });

        Self {
            client,
            provider_name: config.name.clone(),
            model: config.model.clone(),
        }
    }

    /// Read the key from `config.api_key_env`; an unset or blank variable
    /// means no key.
    pub fn from_env(config: &RemoteProviderConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);
        if api_key.is_none() {
            tracing::warn!(
                provider = %config.name,
                env = %config.api_key_env,
                "API key not set; provider will report a missing key"
            );
        }
        Self::new(config, api_key)
    }

    pub fn has_key(&self) -> bool {
        self.client.is_some()
    }

    fn build_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let messages = request
            .messages
            .iter()
            .map(|msg| match msg.role {
                MessageRole::System => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                        content: ChatCompletionRequestSystemMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    })
                }
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                        name: None,
                    })
                }
                MessageRole::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                            msg.content.clone(),
                        )),
                        refusal: None,
                        name: None,
                        audio: None,
                        tool_calls: None,
                        function_call: None,
                    })
                }
            })
            .collect();

        CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            ..Default::default()
        }
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let Some(client) = &self.client else {
            return Err(LlmError::KeyMissing {
                provider: self.provider_name.clone(),
            });
        };

        tracing::debug!(
            provider = %self.provider_name,
            messages = request.messages.len(),
            "Sending chat completion"
        );

        let response = client
            .chat()
            .create(self.build_request(request))
            .await
            .map_err(|e| map_openai_error(&self.provider_name, e))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| EMPTY_COMPLETION_REPLY.to_string());

        Ok(content)
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(provider: &str, err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => classify(
            provider,
            None,
            api_err.code.as_deref(),
            api_err.r#type.as_deref(),
            &api_err.message,
        )
        .unwrap_or_else(|| LlmError::Provider {
            message: err.to_string(),
        }),
        OpenAIError::Reqwest(reqwest_err) => {
            let status = reqwest_err.status().map(|s| s.as_u16());
            match classify(provider, status, None, None, "") {
                Some(signal) => signal,
                None if status.is_some() => LlmError::Provider {
                    message: err.to_string(),
                },
                None => LlmError::Network(err.to_string()),
            }
        }
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}

/// Recognize the fallback signals in an upstream error.
///
/// Returns `None` for anything that is not a quota or key problem.
fn classify(
    provider: &str,
    status: Option<u16>,
    code: Option<&str>,
    error_type: Option<&str>,
    message: &str,
) -> Option<LlmError> {
    let code = code.unwrap_or("");
    let error_type = error_type.unwrap_or("");
    let message = message.to_lowercase();

    let quota = status == Some(429)
        || matches!(code, "insufficient_quota" | "rate_limit_exceeded")
        || matches!(error_type, "insufficient_quota" | "rate_limit_error")
        || message.contains("quota");
    if quota {
        return Some(LlmError::QuotaExceeded {
            provider: provider.to_string(),
        });
    }

    let bad_key = status == Some(401)
        || matches!(code, "invalid_api_key" | "authentication_error")
        || error_type == "authentication_error"
        || message.contains("invalid api key")
        || message.contains("incorrect api key");
    if bad_key {
        return Some(LlmError::KeyInvalid {
            provider: provider.to_string(),
        });
    }

    None
}
