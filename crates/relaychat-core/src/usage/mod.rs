//! Rolling per-identity message quota.
//!
//! `UsageStore` persists one `UsageRecord` per identity and performs the
//! atomic check-and-increment; `UsageTracker` binds a store to the quota
//! policy and the clock.

pub mod repository;
pub mod routed;
pub mod tracker;
