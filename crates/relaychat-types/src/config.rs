//! Global configuration types for Relaychat.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! message quota, the provider chain, and the HTTP identity settings.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::llm::ProviderMode;
use crate::usage::UsagePolicy;

/// Top-level configuration for Relaychat.
///
/// Loaded from `~/.relaychat/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub usage: UsageConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// `[usage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    /// Messages allowed per window.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Length of the rolling window in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_limit() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    3 * 60 * 60
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            window_secs: default_window_secs(),
        }
    }
}

/// Longest accepted quota window (30 days).
pub const MAX_WINDOW_SECS: u64 = 30 * 24 * 60 * 60;

impl UsageConfig {
    /// Reject windows that are empty or long enough to overflow timestamps.
    pub fn validate(&self) -> Result<(), String> {
        if self.window_secs == 0 || self.window_secs > MAX_WINDOW_SECS {
            return Err(format!(
                "usage.window_secs must be between 1 and {MAX_WINDOW_SECS}, got {}",
                self.window_secs
            ));
        }
        Ok(())
    }

    /// The quota policy. An invalid window falls back to the default one.
    pub fn policy(&self) -> UsagePolicy {
        let window = self
            .validate()
            .ok()
            .and_then(|()| i64::try_from(self.window_secs).ok())
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| UsagePolicy::default().window);
        UsagePolicy::new(self.limit, window)
    }
}

/// `[providers]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Mode the fallback chain starts in (and returns to on reset).
    #[serde(default = "default_initial_mode")]
    pub initial_mode: ProviderMode,

    /// Upper bound on a single provider call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Persona prepended to every provider payload.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "RemoteProviderConfig::default_primary")]
    pub primary: RemoteProviderConfig,

    #[serde(default = "RemoteProviderConfig::default_secondary")]
    pub secondary: RemoteProviderConfig,

    #[serde(default)]
    pub local: LocalProviderConfig,
}

fn default_initial_mode() -> ProviderMode {
    ProviderMode::Secondary
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    800
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant that is helpful, creative, clever, and very friendly. \
Provide thoughtful and concise responses to the user's questions or comments. \
If you don't know something, be honest about it rather than making up information.";

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            initial_mode: default_initial_mode(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
            primary: RemoteProviderConfig::default_primary(),
            secondary: RemoteProviderConfig::default_secondary(),
            local: LocalProviderConfig::default(),
        }
    }
}

/// `[providers.primary]` / `[providers.secondary]`: an OpenAI-compatible endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteProviderConfig {
    pub name: String,
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl RemoteProviderConfig {
    pub fn default_primary() -> Self {
        Self {
            name: "OpenAI GPT-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }

    pub fn default_secondary() -> Self {
        Self {
            name: "DeepSeek AI".to_string(),
            base_url: "https://api.deepseek.com/v1".to_string(),
            model: "deepseek-chat".to_string(),
            api_key_env: "DEEPSEEK_API_KEY".to_string(),
        }
    }
}

/// `[providers.local]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalProviderConfig {
    #[serde(default = "default_local_name")]
    pub name: String,
}

fn default_local_name() -> String {
    "Local AI (Fallback)".to_string()
}

impl Default for LocalProviderConfig {
    fn default() -> Self {
        Self {
            name: default_local_name(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Header set by a trusted upstream auth proxy carrying the user id.
    ///
    /// Unset by default: the header is then ignored and every caller is an
    /// anonymous session. Only set this when the proxy strips the header
    /// from client requests.
    #[serde(default)]
    pub user_header: Option<String>,

    /// Cookie holding the anonymous session token.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    /// Static assets directory, served under `/static` when it exists.
    #[serde(default)]
    pub web_dir: Option<String>,

    /// Idle time after which an anonymous session's history is dropped.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_session_cookie() -> String {
    "relaychat_session".to_string()
}

fn default_session_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl ServerConfig {
    /// Session idle limit, never shorter than a minute.
    pub fn session_ttl(&self) -> Duration {
        let secs = i64::try_from(self.session_ttl_secs.max(60)).unwrap_or(i64::MAX);
        Duration::try_seconds(secs).unwrap_or_else(|| Duration::days(365))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            user_header: None,
            session_cookie: default_session_cookie(),
            web_dir: None,
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}
