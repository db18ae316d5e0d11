//! Identity-kind dispatch between two usage backends.

use chrono::{DateTime, Utc};
use relaychat_types::error::RepositoryError;
use relaychat_types::identity::{Identity, IdentityKind};
use relaychat_types::usage::{Acquire, UsagePolicy, UsageRecord};

use super::repository::UsageStore;

/// Sends authenticated users to `users` and anonymous sessions to `sessions`.
#[derive(Debug, Clone)]
pub struct RoutedUsageStore<U, S> {
    users: U,
    sessions: S,
}

impl<U: UsageStore, S: UsageStore> RoutedUsageStore<U, S> {
    pub fn new(users: U, sessions: S) -> Self {
        Self { users, sessions }
    }
}

impl<U: UsageStore, S: UsageStore> UsageStore for RoutedUsageStore<U, S> {
    async fn load(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        match identity.kind() {
            IdentityKind::User => self.users.load(identity, policy, now).await,
            IdentityKind::Session => self.sessions.load(identity, policy, now).await,
        }
    }

    async fn increment(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        match identity.kind() {
            IdentityKind::User => self.users.increment(identity, policy, now).await,
            IdentityKind::Session => self.sessions.increment(identity, policy, now).await,
        }
    }

    async fn try_acquire(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<Acquire, RepositoryError> {
        match identity.kind() {
            IdentityKind::User => self.users.try_acquire(identity, policy, now).await,
            IdentityKind::Session => self.sessions.try_acquire(identity, policy, now).await,
        }
    }

    async fn release(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        match identity.kind() {
            IdentityKind::User => self.users.release(identity, policy, now).await,
            IdentityKind::Session => self.sessions.release(identity, policy, now).await,
        }
    }

    async fn reset(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        match identity.kind() {
            IdentityKind::User => self.users.reset(identity, policy, now).await,
            IdentityKind::Session => self.sessions.reset(identity, policy, now).await,
        }
    }
}
