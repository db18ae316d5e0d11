//! SQLite usage store implementation.
//!
//! Every operation runs as one transaction on the single-connection writer
//! pool: read-or-create, lazy window reset, mutate, write back. Holding the
//! only writer connection for the whole transaction makes `try_acquire`
//! atomic with respect to every other usage write.

use chrono::{DateTime, Utc};
use relaychat_core::usage::repository::UsageStore;
use relaychat_types::error::RepositoryError;
use relaychat_types::identity::Identity;
use relaychat_types::usage::{Acquire, UsagePolicy, UsageRecord};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

pub struct SqliteUsageStore {
    pool: DatabasePool,
}

impl SqliteUsageStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Run `f` against the refreshed record inside a writer transaction and
    /// persist whatever it leaves behind.
    async fn with_record<T>(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut UsageRecord) -> T,
    ) -> Result<T, RepositoryError> {
        let key = identity.storage_key();
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let row = sqlx::query("SELECT count, reset_at FROM usage_records WHERE identity = ?")
            .bind(&key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;

        let mut record = match row {
            Some(row) => {
                let count: i64 = row.try_get("count").map_err(query_error)?;
                let reset_at: String = row.try_get("reset_at").map_err(query_error)?;
                UsageRecord {
                    count: u32::try_from(count).map_err(|_| {
                        RepositoryError::Query(format!("invalid usage count {count} for {key}"))
                    })?,
                    reset_at: parse_datetime(&reset_at)?,
                }
            }
            None => UsageRecord::fresh(now, policy.window),
        };
        record.refresh(now, policy.window);

        let out = f(&mut record);

        sqlx::query(
            "INSERT INTO usage_records (identity, count, reset_at) VALUES (?, ?, ?)
             ON CONFLICT(identity) DO UPDATE SET count = excluded.count, reset_at = excluded.reset_at",
        )
        .bind(&key)
        .bind(i64::from(record.count))
        .bind(format_datetime(&record.reset_at))
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(out)
    }
}

impl UsageStore for SqliteUsageStore {
    async fn load(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        self.with_record(identity, policy, now, |r| r.clone()).await
    }

    async fn increment(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        self.with_record(identity, policy, now, |r| {
            r.count = r.count.saturating_add(1);
            r.clone()
        })
        .await
    }

    async fn try_acquire(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<Acquire, RepositoryError> {
        let limit = policy.limit;
        self.with_record(identity, policy, now, |r| {
            if r.is_limited(limit) {
                Acquire::Limited(r.limit_info(now, limit))
            } else {
                r.count += 1;
                Acquire::Granted {
                    remaining: r.remaining(limit),
                }
            }
        })
        .await
    }

    async fn release(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        self.with_record(identity, policy, now, |r| {
            r.count = r.count.saturating_sub(1);
            r.clone()
        })
        .await
    }

    async fn reset(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, RepositoryError> {
        let window = policy.window;
        self.with_record(identity, policy, now, |r| {
            *r = UsageRecord::fresh(now, window);
            r.clone()
        })
        .await
    }
}
