//! Application error type mapping to HTTP status codes and JSON bodies.
//!
//! Clients only ever see a category code and a fixed message. The
//! underlying error text goes to the log.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use relaychat_core::chat::error::ChatError;
use relaychat_types::identity::Identity;
use relaychat_types::llm::{LlmError, ProviderMode};

pub const MISSING_MESSAGE: &str = "Invalid request. Message is required.";
const SERVER_ERROR_MESSAGE: &str =
    "An error occurred processing your request. Please try again later.";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// A chat operation failed.
    Chat(ChatError),
    /// 500 with a caller-supplied `error` string and no category code.
    Failed(&'static str),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    /// Log a failed chat request with its context and wrap the error.
    pub fn chat(err: ChatError, identity: &Identity, mode: ProviderMode) -> Self {
        match &err {
            ChatError::Validation(_) | ChatError::RateLimited(_) => {
                tracing::debug!(%identity, %mode, error = %err, "Chat request rejected");
            }
            _ => {
                tracing::error!(%identity, %mode, error = %err, "Chat request failed");
            }
        }
        AppError::Chat(err)
    }
}

fn error_body(code: &str, message: &str) -> serde_json::Value {
    json!({ "error": code, "message": message })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Chat(ChatError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, error_body("invalid_request", msg))
            }
            AppError::Chat(ChatError::RateLimited(info)) => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": "rate_limit_exceeded", "limit_info": info }),
            ),
            AppError::Chat(ChatError::Provider(LlmError::QuotaExceeded { .. })) => (
                StatusCode::SERVICE_UNAVAILABLE,
                error_body(
                    "provider_quota_exceeded",
                    "The AI provider quota has been exceeded. Please try again later.",
                ),
            ),
            AppError::Chat(ChatError::Provider(LlmError::KeyInvalid { .. })) => (
                StatusCode::UNAUTHORIZED,
                error_body(
                    "provider_key_invalid",
                    "The AI provider API key is invalid or has expired.",
                ),
            ),
            AppError::Chat(ChatError::Provider(LlmError::KeyMissing { .. })) => (
                StatusCode::UNAUTHORIZED,
                error_body("provider_key_missing", "The AI provider API key is missing."),
            ),
            AppError::Chat(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("server_error", SERVER_ERROR_MESSAGE),
            ),
            AppError::Failed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg })),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_body("server_error", SERVER_ERROR_MESSAGE),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
