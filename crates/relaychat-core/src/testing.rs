//! In-memory store doubles shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use relaychat_types::chat::{ChatTurn, MessageRole};
use relaychat_types::error::RepositoryError;
use relaychat_types::identity::Identity;
use relaychat_types::usage::{Acquire, UsagePolicy, UsageRecord};

use crate::chat::repository::HistoryStore;
use crate::usage::repository::UsageStore;

#[derive(Default)]
pub struct MockUsageStore {
    records: Mutex<HashMap<String, UsageRecord>>,
}

impl MockUsageStore {
    fn with<T>(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut UsageRecord) -> T,
    ) -> T {
        let mut records = self.records.lock().unwrap();
        let record = records
            .entry(identity.storage_key())
            .or_insert_with(|| UsageRecord::fresh(now, policy.window));
        record.refresh(now, policy.window);
        f(record)
    }
}

impl UsageStore for MockUsageStore {
    async fn load(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        Ok(self.with(identity, policy, now, |r| r.clone()))
    }

    async fn increment(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        Ok(self.with(identity, policy, now, |r| {
            r.count += 1;
            r.clone()
        }))
    }

    async fn try_acquire(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<Acquire, RepositoryError> {
        Ok(self.with(identity, policy, now, |r| {
            if r.is_limited(policy.limit) {
                Acquire::Limited(r.limit_info(now, policy.limit))
            } else {
                r.count += 1;
                Acquire::Granted {
                    remaining: r.remaining(policy.limit),
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
        Ok(self.with(identity, policy, now, |r| {
            r.count = r.count.saturating_sub(1);
            r.clone()
        }))
    }

    async fn reset(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        Ok(self.with(identity, policy, now, |r| {
            *r = UsageRecord::fresh(now, policy.window);
            r.clone()
        }))
    }
}

/// History double that can tag itself, so routing tests can tell
/// which backend received a call.
#[derive(Default)]
pub struct MockHistoryStore {
    pub tag: &'static str,
    turns: Mutex<HashMap<String, Vec<ChatTurn>>>,
}

impl MockHistoryStore {
    pub fn tagged(tag: &'static str) -> Self {
        Self {
            tag,
            turns: Mutex::default(),
        }
    }

    pub fn len(&self, identity: &Identity) -> usize {
        self.turns
            .lock()
            .unwrap()
            .get(&identity.storage_key())
            .map_or(0, Vec::len)
    }
}

impl HistoryStore for MockHistoryStore {
    async fn get(&self, identity: &Identity) -> Result<Vec<ChatTurn>, RepositoryError> {
        Ok(self
            .turns
            .lock()
            .unwrap()
            .get(&identity.storage_key())
            .cloned()
            .unwrap_or_default())
    }

    async fn append(
        &self,
        identity: &Identity,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatTurn, RepositoryError> {
        let mut turns = self.turns.lock().unwrap();
        let log = turns.entry(identity.storage_key()).or_default();
        let turn = ChatTurn {
            role,
            content: format!("{}{content}", self.tag),
            sequence: log.len() as i64 + 1,
            created_at: Utc::now(),
        };
        log.push(turn.clone());
        Ok(turn)
    }

    async fn clear(&self, identity: &Identity) -> Result<(), RepositoryError> {
        self.turns.lock().unwrap().remove(&identity.storage_key());
        Ok(())
    }
}
