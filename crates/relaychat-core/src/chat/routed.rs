//! Identity-kind dispatch between two history backends.

use relaychat_types::chat::{ChatTurn, MessageRole};
use relaychat_types::error::RepositoryError;
use relaychat_types::identity::{Identity, IdentityKind};

use super::repository::HistoryStore;

/// Sends authenticated users to `users` and anonymous sessions to `sessions`.
#[derive(Debug, Clone)]
pub struct RoutedHistoryStore<U, S> {
    users: U,
    sessions: S,
}

impl<U: HistoryStore, S: HistoryStore> RoutedHistoryStore<U, S> {
    pub fn new(users: U, sessions: S) -> Self {
        Self { users, sessions }
    }
}

impl<U: HistoryStore, S: HistoryStore> HistoryStore for RoutedHistoryStore<U, S> {
    async fn get(&self, identity: &Identity) -> Result<Vec<ChatTurn>, RepositoryError> {
        match identity.kind() {
            IdentityKind::User => self.users.get(identity).await,
            IdentityKind::Session => self.sessions.get(identity).await,
        }
    }

    async fn append(
        &self,
        identity: &Identity,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatTurn, RepositoryError> {
        match identity.kind() {
            IdentityKind::User => self.users.append(identity, role, content).await,
            IdentityKind::Session => self.sessions.append(identity, role, content).await,
        }
    }

    async fn clear(&self, identity: &Identity) -> Result<(), RepositoryError> {
        match identity.kind() {
            IdentityKind::User => self.users.clear(identity).await,
            IdentityKind::Session => self.sessions.clear(identity).await,
        }
    }
}
