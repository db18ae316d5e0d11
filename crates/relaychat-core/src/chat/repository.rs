//! HistoryStore trait definition.

use relaychat_types::chat::{ChatTurn, MessageRole};
use relaychat_types::error::RepositoryError;
use relaychat_types::identity::Identity;

/// Append-only, ordered chat log keyed by identity.
///
/// Implementations live in relaychat-infra (`SqliteHistoryStore`,
/// `SessionHistoryStore`). Uses native async fn in traits (RPITIT).
pub trait HistoryStore: Send + Sync {
    /// All turns for `identity` in creation order; empty if none.
    fn get(
        &self,
        identity: &Identity,
    ) -> impl std::future::Future<Output = Result<Vec<ChatTurn>, RepositoryError>> + Send;

    /// Append a turn and return it with its assigned sequence.
    fn append(
        &self,
        identity: &Identity,
        role: MessageRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<ChatTurn, RepositoryError>> + Send;

    /// Delete every turn for `identity`.
    fn clear(
        &self,
        identity: &Identity,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
