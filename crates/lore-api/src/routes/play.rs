//! Routes for playing an adventure: opening scene, turns, summaries and NPC
//! drafting.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use lore_core::model::ActionType;
use lore_narrative::application::command_handlers::{self, NpcResult, TurnOutcome};
use lore_narrative::domain::commands;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /adventures/{id}/action.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    /// What the player typed.
    #[serde(alias = "input")]
    pub player_input: String,
    /// How the input is phrased; defaults to `do`.
    #[serde(default)]
    pub action_type: ActionType,
}

/// Request body for POST /scenarios/{id}/generate-npc.
#[derive(Debug, Deserialize)]
pub struct GenerateNpcRequest {
    /// Free-form description of the character wanted.
    #[serde(alias = "request")]
    pub creation_context: String,
    /// Store the draft as a `character` card.
    #[serde(default)]
    pub save: bool,
}

/// Response body for POST /adventures/{id}/summarize.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// POST /adventures/{id}/start
#[instrument(skip(state))]
async fn start_adventure(
    State(state): State<AppState>,
    Path(adventure_id): Path<Uuid>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let command = commands::StartAdventure {
        correlation_id: Uuid::new_v4(),
        adventure_id,
    };

    info!(correlation_id = %command.correlation_id, "handling start_adventure command");

    let outcome = command_handlers::handle_start_adventure(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
        &*state.adventures,
        &*state.llm,
        &state.prompts,
        &state.turn_settings,
    )
    .await?;

    Ok(Json(outcome))
}

/// POST /adventures/{id}/action
#[instrument(skip(state, request), fields(action_type = %request.action_type))]
async fn take_action(
    State(state): State<AppState>,
    Path(adventure_id): Path<Uuid>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let command = commands::TakeTurn {
        correlation_id: Uuid::new_v4(),
        adventure_id,
        action_type: request.action_type,
        input: request.player_input,
    };

    info!(correlation_id = %command.correlation_id, "handling take_turn command");

    let outcome = command_handlers::handle_take_turn(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
        &*state.adventures,
        &*state.llm,
        &state.prompts,
        &state.turn_settings,
    )
    .await?;

    Ok(Json(outcome))
}

/// POST /adventures/{id}/summarize
#[instrument(skip(state))]
async fn summarize(
    State(state): State<AppState>,
    Path(adventure_id): Path<Uuid>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let command = commands::SummarizeAdventure {
        correlation_id: Uuid::new_v4(),
        adventure_id,
    };

    info!(correlation_id = %command.correlation_id, "handling summarize_adventure command");

    let summary = command_handlers::handle_summarize(
        &command,
        state.clock.as_ref(),
        &*state.adventures,
        &*state.llm,
        &state.prompts,
    )
    .await?;

    Ok(Json(SummaryResponse { summary }))
}

/// POST /scenarios/{id}/generate-npc
#[instrument(skip(state, request), fields(save = request.save))]
async fn generate_npc(
    State(state): State<AppState>,
    Path(scenario_id): Path<Uuid>,
    Json(request): Json<GenerateNpcRequest>,
) -> Result<Json<NpcResult>, ApiError> {
    let command = commands::GenerateNpc {
        correlation_id: Uuid::new_v4(),
        scenario_id,
        request: request.creation_context,
        save: request.save,
    };

    info!(correlation_id = %command.correlation_id, "handling generate_npc command");

    let result = command_handlers::handle_generate_npc(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
        &*state.llm,
        &state.prompts,
    )
    .await?;

    Ok(Json(result))
}

/// Returns the router for playing adventures.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/adventures/{id}/start", post(start_adventure))
        .route("/adventures/{id}/action", post(take_action))
        .route("/adventures/{id}/summarize", post(summarize))
        .route("/scenarios/{id}/generate-npc", post(generate_npc))
}
