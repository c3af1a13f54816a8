//! Runtime model settings.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use lore_llm::{LlmSettings, SettingsUpdate};
use serde::Serialize;
use tracing::{info, instrument};

use crate::state::AppState;

/// Response body for the settings endpoints.
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: LlmSettings,
}

/// GET /settings
async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        settings: state.llm_settings.snapshot(),
    })
}

/// PUT /settings
#[instrument(skip(state, update))]
async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Json<SettingsResponse> {
    let settings = state.llm_settings.update(&update);
    info!(
        story_model = %settings.story_model,
        character_model = %settings.character_model,
        api_base = %settings.api_base,
        "model settings updated"
    );
    Json(SettingsResponse { settings })
}

/// Returns the settings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}
