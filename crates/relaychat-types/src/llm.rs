//! LLM request/response types for Relaychat.
//!
//! These types model the data shapes for provider interactions: the
//! formatted message list, completion parameters, the provider fallback
//! mode, and the closed set of provider failure signals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in an LLM conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Request to an LLM provider for a completion.
///
/// `messages` is the fully formatted conversation: persona system message
/// first, then every stored turn in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Which provider slot the fallback state machine currently routes to.
///
/// Demotion order is `Secondary -> Primary -> Local`; there is no
/// automatic promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    Secondary,
    Primary,
    Local,
}

impl ProviderMode {
    /// All modes in demotion order.
    pub const ORDER: [ProviderMode; 3] = [
        ProviderMode::Secondary,
        ProviderMode::Primary,
        ProviderMode::Local,
    ];

    /// The next mode down the chain, or `None` from `Local`.
    pub fn demoted(self) -> Option<ProviderMode> {
        match self {
            ProviderMode::Secondary => Some(ProviderMode::Primary),
            ProviderMode::Primary => Some(ProviderMode::Local),
            ProviderMode::Local => None,
        }
    }

    /// Slot index into a three-entry provider table.
    pub fn index(self) -> usize {
        match self {
            ProviderMode::Secondary => 0,
            ProviderMode::Primary => 1,
            ProviderMode::Local => 2,
        }
    }

    pub fn is_local(self) -> bool {
        self == ProviderMode::Local
    }
}

impl fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderMode::Secondary => write!(f, "secondary"),
            ProviderMode::Primary => write!(f, "primary"),
            ProviderMode::Local => write!(f, "local"),
        }
    }
}

impl FromStr for ProviderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "secondary" => Ok(ProviderMode::Secondary),
            "primary" => Ok(ProviderMode::Primary),
            "local" => Ok(ProviderMode::Local),
            other => Err(format!("invalid provider mode: '{other}'")),
        }
    }
}

/// Active-provider metadata returned alongside every chat response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub mode: ProviderMode,
    pub name: String,
    pub is_local: bool,
}

/// Errors from LLM provider operations.
///
/// The first three variants are the recognized fallback signals; anything
/// else aborts the request without demoting the provider mode.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("{provider}: quota exceeded")]
    QuotaExceeded { provider: String },

    #[error("{provider}: invalid API key")]
    KeyInvalid { provider: String },

    #[error("{provider}: API key not configured")]
    KeyMissing { provider: String },

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("{provider}: no response within {secs}s")]
    Timeout { provider: String, secs: u64 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// Whether this failure should demote the provider mode one step.
    pub fn is_recognized_signal(&self) -> bool {
        matches!(
            self,
            LlmError::QuotaExceeded { .. } | LlmError::KeyInvalid { .. } | LlmError::KeyMissing { .. }
        )
    }
}
