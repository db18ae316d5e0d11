use relaychat_types::error::RepositoryError;
use relaychat_types::llm::LlmError;
use relaychat_types::usage::LimitInfo;
use thiserror::Error;

/// Failures of a chat request, one variant per client-visible category.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("message quota exhausted")]
    RateLimited(LimitInfo),

    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}
