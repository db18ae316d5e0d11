//! UsageStore trait definition.

use chrono::{DateTime, Utc};
use relaychat_types::error::RepositoryError;
use relaychat_types::identity::Identity;
use relaychat_types::usage::{Acquire, UsagePolicy, UsageRecord};

/// Per-identity usage counters.
///
/// Every operation reads-or-creates the record and applies the lazy window
/// reset (see [`UsageRecord::refresh`]) before doing anything else, and
/// persists the result. Implementations must make `try_acquire` atomic per
/// identity: concurrent callers can never push `count` past `policy.limit`.
pub trait UsageStore: Send + Sync {
    /// Current record after the lazy reset.
    fn load(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<UsageRecord, RepositoryError>> + Send;

    /// Unconditionally add one to the count.
    fn increment(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<UsageRecord, RepositoryError>> + Send;

    /// Add one to the count only if it is below the limit.
    fn try_acquire(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Acquire, RepositoryError>> + Send;

    /// Give back one slot, saturating at zero.
    fn release(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<UsageRecord, RepositoryError>> + Send;

    /// Zero the count and start a new window from `now`.
    fn reset(
        &self,
        identity: &Identity,
        policy: &UsagePolicy,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<UsageRecord, RepositoryError>> + Send;
}
