//! Request identity: authenticated user or anonymous browser session.
//!
//! Every chat request carries exactly one [`Identity`]. Its [`IdentityKind`]
//! decides which storage backend holds the identity's history and usage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which storage partition an identity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    /// Authenticated user; persisted durably.
    User,
    /// Anonymous browser session; lives as long as the process.
    Session,
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKind::User => write!(f, "user"),
            IdentityKind::Session => write!(f, "session"),
        }
    }
}

/// The key under which history and quota are partitioned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Identity {
    /// Authenticated user with a stable opaque id.
    User(String),
    /// Anonymous session with an opaque token scoped to one browser.
    Session(String),
}

impl Identity {
    pub fn user(id: impl Into<String>) -> Self {
        Identity::User(id.into())
    }

    pub fn session(token: impl Into<String>) -> Self {
        Identity::Session(token.into())
    }

    pub fn kind(&self) -> IdentityKind {
        match self {
            Identity::User(_) => IdentityKind::User,
            Identity::Session(_) => IdentityKind::Session,
        }
    }

    /// The raw id or token, without the kind prefix.
    pub fn id(&self) -> &str {
        match self {
            Identity::User(id) | Identity::Session(id) => id,
        }
    }

    /// Storage key, e.g. `user:42` or `session:9f1c...`.
    pub fn storage_key(&self) -> String {
        format!("{}:{}", self.kind(), self.id())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::User(id) => write!(f, "user:{id}"),
            // Session tokens are bearer credentials; only log a prefix.
            Identity::Session(token) => {
                let shown: String = token.chars().take(8).collect();
                write!(f, "session:{shown}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_is_partitioned_by_kind() {
        let user = Identity::user("42");
        assert_eq!(user.storage_key(), "user:42");
        assert_eq!(user.kind(), IdentityKind::User);

        let session = Identity::session("42");
        assert_eq!(session.kind(), IdentityKind::Session);
        assert_eq!(session.storage_key(), "session:42");
        assert_ne!(user.storage_key(), session.storage_key());
    }

    #[test]
    fn test_display_truncates_session_token() {
        let session = Identity::session("0123456789abcdef");
        assert_eq!(session.to_string(), "session:01234567");
        assert_eq!(Identity::user("7").to_string(), "user:7");
    }
}
