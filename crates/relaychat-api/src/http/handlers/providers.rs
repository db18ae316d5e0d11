//! Provider chain inspection.
//!
//! Endpoints:
//! - GET /api/providers - Active provider and the demotion order
//!
//! Read-only. Restoring the initial mode is an operator action (SIGHUP).

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use relaychat_types::llm::{ProviderInfo, ProviderMode};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub ai_info: ProviderInfo,
    pub initial_mode: ProviderMode,
    pub chain: Vec<ProviderInfo>,
}

pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    let selector = state.chat_service.selector();
    Json(ProvidersResponse {
        ai_info: selector.current_info(),
        initial_mode: selector.mode_state().initial(),
        chain: selector.chain(),
    })
}
