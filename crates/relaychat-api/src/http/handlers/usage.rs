//! GET /api/usage - Quota status of the caller.

use axum::Json;
use axum::extract::State;

use relaychat_types::usage::UsageStatus;

use crate::http::error::AppError;
use crate::http::extractors::identity::CurrentIdentity;
use crate::state::AppState;

pub async fn get_usage(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<UsageStatus>, AppError> {
    match state.chat_service.usage(&identity).await {
        Ok(status) => Ok(Json(status)),
        Err(e) => {
            tracing::error!(%identity, error = %e, "Failed to get usage information");
            Err(AppError::Failed("Failed to get usage information."))
        }
    }
}
