//! In-process stores for anonymous browser sessions.
//!
//! Both stores are `DashMap`s keyed by the identity's storage key. Guards
//! are dropped before returning, so nothing is held across an `.await`.
//! Reads never create entries, and [`spawn_sweeper`] evicts idle sessions
//! so the maps stay bounded by recent traffic.

pub mod history;
pub mod usage;

use chrono::Utc;
use tokio::task::JoinHandle;

use self::history::SessionHistoryStore;
use self::usage::SessionUsageStore;

/// Evict stale session state once. Returns `(history, usage)` removals.
pub fn sweep(
    history: &SessionHistoryStore,
    usage: &SessionUsageStore,
    max_idle: chrono::Duration,
) -> (usize, usize) {
    let now = Utc::now();
    (history.evict_idle(now, max_idle), usage.evict_expired(now))
}

/// Run [`sweep`] every `every` until the task is aborted.
pub fn spawn_sweeper(
    history: SessionHistoryStore,
    usage: SessionUsageStore,
    every: std::time::Duration,
    max_idle: chrono::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let (turns, records) = sweep(&history, &usage, max_idle);
            if turns + records > 0 {
                tracing::debug!(
                    history_evicted = turns,
                    usage_evicted = records,
                    history_live = history.len(),
                    usage_live = usage.len(),
                    "Swept idle sessions"
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use relaychat_core::chat::repository::HistoryStore;
    use relaychat_core::usage::repository::UsageStore;
    use relaychat_types::chat::MessageRole;
    use relaychat_types::identity::Identity;
    use relaychat_types::usage::UsagePolicy;

    #[tokio::test]
    async fn test_sweep_keeps_recent_sessions() {
        let history = SessionHistoryStore::new();
        let usage = SessionUsageStore::new();
        let id = Identity::session("recent");
        history.append(&id, MessageRole::User, "hi").await.unwrap();
        usage
            .try_acquire(&id, &UsagePolicy::default(), Utc::now())
            .await
            .unwrap();

        assert_eq!(sweep(&history, &usage, Duration::hours(24)), (0, 0));
        assert_eq!(history.len(), 1);
        assert_eq!(usage.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_windows() {
        let history = SessionHistoryStore::new();
        let usage = SessionUsageStore::new();
        let id = Identity::session("gone");
        let long_ago = Utc::now() - Duration::hours(5);
        usage
            .try_acquire(&id, &UsagePolicy::default(), long_ago)
            .await
            .unwrap();

        assert_eq!(sweep(&history, &usage, Duration::hours(24)), (0, 1));
        assert!(usage.is_empty());
    }
}
