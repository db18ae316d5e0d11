//! `UsageStore` for anonymous sessions.
//!
//! Each write runs while holding the `DashMap` entry guard for the
//! identity, so read, reset, check and increment happen as one step.
//! Only a granted request or an increment creates an entry; an absent entry
//! reads as a fresh window.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use relaychat_core::usage::repository::UsageStore;
use relaychat_types::error::RepositoryError;
use relaychat_types::identity::Identity;
use relaychat_types::usage::{Acquire, UsagePolicy, UsageRecord};

#[derive(Debug, Clone, Default)]
pub struct SessionUsageStore {
    records: Arc<DashMap<String, UsageRecord>>,
}

impl SessionUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions holding a usage record.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop records whose window ended before `now`. Returns how many were
    /// removed. A dropped record reads back as fresh, so quota is unaffected.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.reset_at >= now);
        before.saturating_sub(self.records.len())
    }

    fn with_record<T>(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut UsageRecord) -> T,
    ) -> T {
        let mut record = self
            .records
            .entry(identity.storage_key())
            .or_insert_with(|| UsageRecord::fresh(now, policy.window));
        record.refresh(now, policy.window);
        f(record.value_mut())
    }
}

impl UsageStore for SessionUsageStore {
    async fn load(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        let record = match self.records.get(&identity.storage_key()) {
            Some(entry) => {
                let mut record = entry.value().clone();
                record.refresh(now, policy.window);
                record
            }
            None => UsageRecord::fresh(now, policy.window),
        };
        Ok(record)
    }

    async fn increment(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        Ok(self.with_record(identity, policy, now, |r| {
            r.count = r.count.saturating_add(1);
            r.clone()
        }))
    }

    async fn try_acquire(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<Acquire, RepositoryError> {
        let limit = policy.limit;
        Ok(self.with_record(identity, policy, now, |r| {
            if r.is_limited(limit) {
                Acquire::Limited(r.limit_info(now, limit))
            } else {
                r.count += 1;
                Acquire::Granted {
                    remaining: r.remaining(limit),
                }
            }
        }))
    }

    async fn release(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        match self.records.get_mut(&identity.storage_key()) {
            Some(mut entry) => {
                let record = entry.value_mut();
                record.refresh(now, policy.window);
                record.count = record.count.saturating_sub(1);
                Ok(record.clone())
            }
            None => Ok(UsageRecord::fresh(now, policy.window)),
        }
    }

    async fn reset(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        self.records.remove(&identity.storage_key());
        Ok(UsageRecord::fresh(now, policy.window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_idle_reset_starts_window_from_now() {
        let store = SessionUsageStore::new();
        let policy = UsagePolicy::default();
        let id = Identity::session("s");
        for _ in 0..5 {
            store.increment(&id, &policy, t0()).await.unwrap();
        }
        assert_eq!(
            store.load(&id, &policy, t0() + Duration::hours(3)).await.unwrap().count,
            5
        );

        let idle = t0() + Duration::hours(10);
        let record = store.load(&id, &policy, idle).await.unwrap();
        assert_eq!(record.count, 0);
        assert_eq!(record.reset_at, idle + Duration::hours(3));
    }

    #[tokio::test]
    async fn test_release_saturates_at_zero() {
        let store = SessionUsageStore::new();
        let policy = UsagePolicy::default();
        let record = store
            .release(&Identity::session("s"), &policy, t0())
            .await
            .unwrap();
        assert_eq!(record.count, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_reads_of_unknown_sessions_leave_map_empty() {
        let store = SessionUsageStore::new();
        let policy = UsagePolicy::default();
        for i in 0..100 {
            let id = Identity::session(format!("tok-{i}"));
            let record = store.load(&id, &policy, t0()).await.unwrap();
            assert_eq!(record.count, 0);
            assert_eq!(record.reset_at, t0() + Duration::hours(3));
            store.reset(&id, &policy, t0()).await.unwrap();
        }
        assert!(store.is_empty());

        store
            .try_acquire(&Identity::session("tok-1"), &policy, t0())
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_evict_expired_keeps_live_windows() {
        let store = SessionUsageStore::new();
        let policy = UsagePolicy::default();
        let old = Identity::session("old");
        let live = Identity::session("live");
        store.try_acquire(&old, &policy, t0()).await.unwrap();
        store
            .try_acquire(&live, &policy, t0() + Duration::hours(2))
            .await
            .unwrap();

        let removed = store.evict_expired(t0() + Duration::hours(4));
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        let record = store
            .load(&live, &policy, t0() + Duration::hours(4))
            .await
            .unwrap();
        assert_eq!(record.count, 1);
        let record = store
            .load(&old, &policy, t0() + Duration::hours(4))
            .await
            .unwrap();
        assert_eq!(record.count, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_try_acquire_never_exceeds_limit() {
        let store = SessionUsageStore::new();
        let policy = UsagePolicy::default();
        let id = Identity::session("race");

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store.try_acquire(&id, &policy, Utc::now()).await.unwrap()
            }));
        }

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap().is_granted() {
                granted += 1;
            }
        }
        assert_eq!(granted, policy.limit);
    }
}
