//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both the CLI and
//! the HTTP handlers. ChatService is generic over its stores; AppState pins
//! it to SQLite for authenticated users and in-process maps for anonymous
//! sessions.

use std::path::PathBuf;
use std::sync::Arc;

use relaychat_core::chat::routed::RoutedHistoryStore;
use relaychat_core::chat::service::ChatService;
use relaychat_core::llm::selector::ProviderSelector;
use relaychat_core::usage::routed::RoutedUsageStore;
use relaychat_core::usage::tracker::UsageTracker;
use relaychat_infra::config::{load_global_config, resolve_data_dir};
use relaychat_infra::llm::build_selector;
use relaychat_infra::session::history::SessionHistoryStore;
use relaychat_infra::session::usage::SessionUsageStore;
use relaychat_infra::sqlite::history::SqliteHistoryStore;
use relaychat_infra::sqlite::pool::{DatabasePool, database_url};
use relaychat_infra::sqlite::usage::SqliteUsageStore;
use relaychat_types::config::{GlobalConfig, ServerConfig};

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteHistoryStore = RoutedHistoryStore<SqliteHistoryStore, SessionHistoryStore>;

pub type ConcreteUsageStore = RoutedUsageStore<SqliteUsageStore, SessionUsageStore>;

pub type ConcreteChatService = ChatService<ConcreteHistoryStore, ConcreteUsageStore>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub server: Arc<ServerConfig>,
    pub data_dir: PathBuf,
    /// Shared views of the anonymous-session stores, for eviction.
    pub session_history: SessionHistoryStore,
    pub session_usage: SessionUsageStore,
}

impl AppState {
    /// Initialize the application state: load config, connect to the DB,
    /// wire the provider chain and the chat service.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let selector = build_selector(&config.providers);

        tracing::debug!(data_dir = %data_dir.display(), "Application state initialized");
        Ok(Self::from_parts(&config, db_pool, selector, data_dir))
    }

    /// Wire the state from already-built parts.
    pub fn from_parts(
        config: &GlobalConfig,
        db_pool: DatabasePool,
        selector: ProviderSelector,
        data_dir: PathBuf,
    ) -> Self {
        let session_history = SessionHistoryStore::new();
        let session_usage = SessionUsageStore::new();
        let history = RoutedHistoryStore::new(
            SqliteHistoryStore::new(db_pool.clone()),
            session_history.clone(),
        );
        let usage = RoutedUsageStore::new(
            SqliteUsageStore::new(db_pool),
            session_usage.clone(),
        );

        let chat_service = ChatService::new(
            history,
            UsageTracker::new(usage, config.usage.policy()),
            selector,
            config.providers.system_prompt.clone(),
        );

        Self {
            chat_service: Arc::new(chat_service),
            server: Arc::new(config.server.clone()),
            data_dir,
            session_history,
            session_usage,
        }
    }
}
