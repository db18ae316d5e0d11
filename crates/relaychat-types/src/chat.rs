//! Chat turn and chat view types for Relaychat.
//!
//! A chat history is an append-only, ordered log of [`ChatTurn`]s per
//! identity. The full log is replayed to the provider on every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::ProviderInfo;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// One stored message of a conversation.
///
/// Turns are immutable once appended. `sequence` is the insertion order
/// within the owning identity and starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
    pub sequence: i64,
    pub created_at: DateTime<Utc>,
}

/// Successful reply to a chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub remaining_messages: u32,
    pub ai_info: ProviderInfo,
}

/// Everything the chat page needs to render for one identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSnapshot {
    pub chat_history: Vec<ChatTurn>,
    pub remaining_messages: u32,
    pub ai_info: ProviderInfo,
}
