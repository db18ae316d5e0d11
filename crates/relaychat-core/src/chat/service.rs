//! Chat request orchestration.
//!
//! ChatService gates every message through the quota, records both sides of
//! the exchange in the history store, and asks the provider selector for
//! the reply. Generic over the stores to keep relaychat-core free of any
//! infrastructure dependency.

use relaychat_types::chat::{ChatReply, ChatSnapshot, MessageRole};
use relaychat_types::identity::Identity;
use relaychat_types::usage::{Acquire, UsageStatus};
use tracing::{info, warn};

use super::error::ChatError;
use super::repository::HistoryStore;
use crate::llm::prompt::format_messages;
use crate::llm::selector::{ProviderSelector, SelectionResult};
use crate::usage::repository::UsageStore;
use crate::usage::tracker::UsageTracker;

pub struct ChatService<H: HistoryStore, U: UsageStore> {
    history: H,
    usage: UsageTracker<U>,
    selector: ProviderSelector,
    system_prompt: String,
}

impl<H: HistoryStore, U: UsageStore> ChatService<H, U> {
    pub fn new(
        history: H,
        usage: UsageTracker<U>,
        selector: ProviderSelector,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            history,
            usage,
            selector,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn usage_tracker(&self) -> &UsageTracker<U> {
        &self.usage
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    /// Handle one inbound chat message.
    ///
    /// The quota slot is taken before anything else and given back if the
    /// message is rejected or no reply is produced. A user turn that was
    /// already stored stays in the history on provider failure.
    pub async fn send_message(
        &self,
        identity: &Identity,
        message: &str,
    ) -> Result<ChatReply, ChatError> {
        let remaining = match self.usage.try_acquire(identity).await? {
            Acquire::Granted { remaining } => remaining,
            Acquire::Limited(info) => return Err(ChatError::RateLimited(info)),
        };

        let content = message.trim();
        if content.is_empty() {
            self.give_back(identity).await;
            return Err(ChatError::Validation("Message cannot be empty.".to_string()));
        }

        match self.exchange(identity, content).await {
            Ok(result) => {
                info!(
                    %identity,
                    mode = %result.info.mode,
                    remaining,
                    "Chat message answered"
                );
                Ok(ChatReply {
                    response: result.text,
                    remaining_messages: remaining,
                    ai_info: result.info,
                })
            }
            Err(err) => {
                self.give_back(identity).await;
                Err(err)
            }
        }
    }

    async fn exchange(&self, identity: &Identity, content: &str) -> Result<SelectionResult, ChatError> {
        self.history.append(identity, MessageRole::User, content).await?;
        let history = self.history.get(identity).await?;
        let messages = format_messages(&self.system_prompt, &history);

        let result = self.selector.complete(messages).await?;

        self.history
            .append(identity, MessageRole::Assistant, &result.text)
            .await?;
        Ok(result)
    }

    async fn give_back(&self, identity: &Identity) {
        if let Err(err) = self.usage.release(identity).await {
            warn!(%identity, error = %err, "Failed to release usage slot");
        }
    }

    /// Everything the chat page shows for `identity`.
    pub async fn snapshot(&self, identity: &Identity) -> Result<ChatSnapshot, ChatError> {
        let chat_history = self.history.get(identity).await?;
        let remaining_messages = self.usage.remaining(identity).await?;
        Ok(ChatSnapshot {
            chat_history,
            remaining_messages,
            ai_info: self.selector.current_info(),
        })
    }

    pub async fn usage(&self, identity: &Identity) -> Result<UsageStatus, ChatError> {
        Ok(self.usage.check_limit(identity).await?)
    }

    pub async fn clear(&self, identity: &Identity) -> Result<(), ChatError> {
        self.history.clear(identity).await?;
        info!(%identity, "Chat history cleared");
        Ok(())
    }

    pub async fn reset_usage(&self, identity: &Identity) -> Result<UsageStatus, ChatError> {
        self.usage.reset(identity).await?;
        self.usage(identity).await
    }
}
