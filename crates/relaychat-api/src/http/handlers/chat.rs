//! Chat HTTP handlers.
//!
//! Endpoints:
//! - GET  /                - Chat view model (history, quota, provider)
//! - POST /api/chat        - Send a message
//! - POST /api/chat/clear  - Clear the caller's history

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;

use relaychat_core::chat::error::ChatError;
use relaychat_types::chat::{ChatReply, ChatSnapshot};

use crate::http::error::{AppError, MISSING_MESSAGE};
use crate::http::extractors::identity::CurrentIdentity;
use crate::state::AppState;

/// Request body for `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

/// GET / - Everything the chat page renders for the caller.
pub async fn index(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<ChatSnapshot>, AppError> {
    let snapshot = state
        .chat_service
        .snapshot(&identity)
        .await
        .map_err(|e| AppError::chat(e, &identity, current_mode(&state)))?;
    Ok(Json(snapshot))
}

/// POST /api/chat - Answer one message.
///
/// The body is parsed leniently so the quota check still runs first for a
/// malformed request, and a missing message reports as an invalid request.
pub async fn send_message(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let message = match payload {
        Ok(Json(ChatRequest {
            message: Some(message),
        })) => Some(message),
        _ => None,
    };

    let result = state
        .chat_service
        .send_message(&identity, message.as_deref().unwrap_or_default())
        .await;

    match result {
        Ok(reply) => Ok(Json(reply)),
        Err(ChatError::Validation(_)) if message.is_none() => Err(AppError::chat(
            ChatError::Validation(MISSING_MESSAGE.to_string()),
            &identity,
            current_mode(&state),
        )),
        Err(e) => Err(AppError::chat(e, &identity, current_mode(&state))),
    }
}

/// POST /api/chat/clear - Delete the caller's history. Quota is kept.
pub async fn clear_chat(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Err(e) = state.chat_service.clear(&identity).await {
        tracing::error!(%identity, error = %e, "Failed to clear chat history");
        return Err(AppError::Failed("Failed to clear chat history."));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

fn current_mode(state: &AppState) -> relaychat_types::llm::ProviderMode {
    state.chat_service.selector().mode_state().current()
}
