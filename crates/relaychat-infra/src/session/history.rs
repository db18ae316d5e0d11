//! `HistoryStore` for anonymous sessions.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use relaychat_core::chat::repository::HistoryStore;
use relaychat_types::chat::{ChatTurn, MessageRole};
use relaychat_types::error::RepositoryError;
use relaychat_types::identity::Identity;

/// Cloning produces a shared view of the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct SessionHistoryStore {
    turns: Arc<DashMap<String, Vec<ChatTurn>>>,
}

impl SessionHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions holding any history.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop sessions whose latest turn is older than `max_idle`. Returns how
    /// many sessions were removed.
    pub fn evict_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let before = self.turns.len();
        self.turns.retain(|_, log| {
            log.last()
                .is_some_and(|turn| turn.created_at + max_idle > now)
        });
        before.saturating_sub(self.turns.len())
    }
}

impl HistoryStore for SessionHistoryStore {
    async fn get(&self, identity: &Identity) -> Result<Vec<ChatTurn>, RepositoryError> {
        Ok(self
            .turns
            .get(&identity.storage_key())
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    async fn append(
        &self,
        identity: &Identity,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatTurn, RepositoryError> {
        let mut log = self.turns.entry(identity.storage_key()).or_default();
        let sequence = log.last().map_or(1, |t| t.sequence + 1);
        let turn = ChatTurn {
            role,
            content: content.to_string(),
            sequence,
            created_at: Utc::now(),
        };
        log.push(turn.clone());
        Ok(turn)
    }

    async fn clear(&self, identity: &Identity) -> Result<(), RepositoryError> {
        self.turns.remove(&identity.storage_key());
        Ok(())
    }
}
