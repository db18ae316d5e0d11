//! Quota enforcement on top of a [`UsageStore`].
//!
//! Each public method has an `_at` twin taking an explicit `now`, which is
//! what the window tests drive. The plain variants read the wall clock.

use chrono::{DateTime, Utc};
use relaychat_types::error::RepositoryError;
use relaychat_types::identity::Identity;
use relaychat_types::usage::{Acquire, UsagePolicy, UsageStatus};

use super::repository::UsageStore;

pub struct UsageTracker<S: UsageStore> {
    store: S,
    policy: UsagePolicy,
}

impl<S: UsageStore> UsageTracker<S> {
    pub fn new(store: S, policy: UsagePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &UsagePolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn check_limit(&self, identity: &Identity) -> Result<UsageStatus, RepositoryError> {
        self.check_limit_at(identity, Utc::now()).await
    }

    pub async fn check_limit_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<UsageStatus, RepositoryError> {
        let record = self.store.load(identity, &self.policy, now).await?;
        Ok(record.status(now, self.policy.limit))
    }

    pub async fn increment(&self, identity: &Identity) -> Result<(), RepositoryError> {
        self.increment_at(identity, Utc::now()).await
    }

    pub async fn increment_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let record = self.store.increment(identity, &self.policy, now).await?;
        tracing::debug!(%identity, count = record.count, "Usage incremented");
        Ok(())
    }

    pub async fn remaining(&self, identity: &Identity) -> Result<u32, RepositoryError> {
        self.remaining_at(identity, Utc::now()).await
    }

    pub async fn remaining_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<u32, RepositoryError> {
        let record = self.store.load(identity, &self.policy, now).await?;
        Ok(record.remaining(self.policy.limit))
    }

    pub async fn reset(&self, identity: &Identity) -> Result<(), RepositoryError> {
        self.reset_at(identity, Utc::now()).await
    }

    pub async fn reset_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.store.reset(identity, &self.policy, now).await?;
        tracing::info!(%identity, "Usage reset");
        Ok(())
    }

    /// Atomically take one slot if the quota allows it.
    pub async fn try_acquire(&self, identity: &Identity) -> Result<Acquire, RepositoryError> {
        self.try_acquire_at(identity, Utc::now()).await
    }

    pub async fn try_acquire_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<Acquire, RepositoryError> {
        let outcome = self.store.try_acquire(identity, &self.policy, now).await?;
        if let Acquire::Limited(info) = &outcome {
            tracing::info!(
                %identity,
                remaining_time = info.remaining_time,
                "Message quota exhausted"
            );
        }
        Ok(outcome)
    }

    /// Return a slot taken by a request that did not complete.
    pub async fn release(&self, identity: &Identity) -> Result<(), RepositoryError> {
        self.release_at(identity, Utc::now()).await
    }

    pub async fn release_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.store.release(identity, &self.policy, now).await?;
        Ok(())
    }
}
