//! Provider payload formatting.

use relaychat_types::chat::ChatTurn;
use relaychat_types::llm::{Message, MessageRole};

/// Prepend the persona system message to the full ordered history.
pub fn format_messages(system_prompt: &str, history: &[ChatTurn]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Message::new(MessageRole::System, system_prompt));
    messages.extend(
        history
            .iter()
            .map(|turn| Message::new(turn.role, turn.content.clone())),
    );
    messages
}

/// Content of the most recent user message, if any.
pub fn latest_user_message(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
}
