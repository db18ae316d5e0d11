//! Offline fallback responder.
//!
//! The last slot of the fallback chain. Never calls out: it classifies the
//! latest user message by keyword and answers with a canned line.

use rand::seq::SliceRandom;

use relaychat_core::llm::prompt::latest_user_message;
use relaychat_core::llm::provider::LlmProvider;
use relaychat_types::llm::{CompletionRequest, LlmError};

const GREETING_TOKENS: &[&str] = &["hello", "hi", "hey", "greetings", "olá", "oi"];

const QUESTION_MARKERS: &[&str] = &[
    "?", "what", "why", "how", "when", "who", "where", "can you", "could you",
];

const GREETING_REPLIES: &[&str] = &[
    "Hello! I'm a local AI assistant. The OpenAI service is currently unavailable, so I'm providing limited responses.",
    "Hi there! I'm operating in local mode because the OpenAI API is unavailable right now.",
    "Greetings! I'm a basic assistant running locally because the OpenAI service is down or quota exceeded.",
];

const QUESTION_REPLIES: &[&str] = &[
    "I'm running in local mode due to API limitations. I can only provide basic responses at the moment.",
    "Since I'm running locally, I can't access the full AI capabilities. Please try again later when the API is available.",
    "I'm a basic local assistant with limited capabilities. The OpenAI API service is currently unavailable.",
];

const UNKNOWN_REPLIES: &[&str] = &[
    "I'm sorry, I'm running in local mode with limited capabilities because the OpenAI API is unavailable.",
    "The OpenAI API is currently unavailable, so I can only offer basic responses.",
    "I'm operating in fallback mode due to API limitations. Please try again later for better assistance.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Question,
    Unknown,
}

impl Intent {
    /// Case-insensitive substring match; greetings win over questions.
    pub fn classify(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return Intent::Unknown;
        };
        let text = text.to_lowercase();
        if GREETING_TOKENS.iter().any(|t| text.contains(t)) {
            Intent::Greeting
        } else if QUESTION_MARKERS.iter().any(|m| text.contains(m)) {
            Intent::Question
        } else {
            Intent::Unknown
        }
    }

    pub fn replies(self) -> &'static [&'static str] {
        match self {
            Intent::Greeting => GREETING_REPLIES,
            Intent::Question => QUESTION_REPLIES,
            Intent::Unknown => UNKNOWN_REPLIES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalFallbackProvider {
    name: String,
}

impl LocalFallbackProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn reply(&self, request: &CompletionRequest) -> String {
        let intent = Intent::classify(latest_user_message(&request.messages));
        let pool = intent.replies();
        let reply = pool
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(UNKNOWN_REPLIES[0]);
        tracing::debug!(?intent, "Local fallback reply");
        reply.to_string()
    }
}

impl LlmProvider for LocalFallbackProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        Ok(self.reply(request))
    }
}
