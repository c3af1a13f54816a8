//! Routes for the adventure lifecycle.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use lore_adventure::application::query_handlers::{AdventureSummary, AdventureView};
use lore_adventure::application::{command_handlers, query_handlers};
use lore_adventure::domain::commands;
use lore_core::model::{Adventure, StoryEvent};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::DeletedResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string for GET /adventures.
#[derive(Debug, Deserialize)]
pub struct ListAdventuresQuery {
    /// Only list adventures of this scenario.
    pub scenario_id: Option<Uuid>,
}

/// Request body for POST /scenarios/{id}/adventures. The body is optional.
#[derive(Debug, Default, Deserialize)]
pub struct CreateAdventureRequest {
    /// Title; defaults to "Adventure in <scenario title>".
    #[serde(default)]
    pub title: Option<String>,
}

/// Request body for PUT /adventures/{id}. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAdventureRequest {
    pub title: Option<String>,
    pub current_story_summary: Option<String>,
    pub memory: Option<String>,
}

/// Response body carrying one adventure record.
#[derive(Debug, Serialize)]
pub struct AdventureResponse {
    pub adventure: Adventure,
}

/// Response body for GET /adventures/{id}.
#[derive(Debug, Serialize)]
pub struct AdventureViewResponse {
    pub adventure: AdventureView,
}

/// Response body for GET /adventures.
#[derive(Debug, Serialize)]
pub struct AdventureListResponse {
    pub adventures: Vec<AdventureSummary>,
}

/// Response body for POST /adventures/{id}/undo.
#[derive(Debug, Serialize)]
pub struct UndoResponse {
    /// The event that was removed.
    pub undone: StoryEvent,
}

/// GET /adventures
#[instrument(skip(state))]
async fn list_adventures(
    State(state): State<AppState>,
    Query(query): Query<ListAdventuresQuery>,
) -> Result<Json<AdventureListResponse>, ApiError> {
    let adventures = query_handlers::list_adventures(query.scenario_id, &*state.adventures).await?;
    Ok(Json(AdventureListResponse { adventures }))
}

/// POST /scenarios/{id}/adventures
#[instrument(skip(state, request))]
async fn create_adventure(
    State(state): State<AppState>,
    Path(scenario_id): Path<Uuid>,
    request: Option<Json<CreateAdventureRequest>>,
) -> Result<(StatusCode, Json<AdventureResponse>), ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let command = commands::CreateAdventure {
        correlation_id: Uuid::new_v4(),
        scenario_id,
        title: request.title,
    };

    info!(correlation_id = %command.correlation_id, "handling create_adventure command");

    let adventure = command_handlers::handle_create_adventure(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
        &*state.adventures,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(AdventureResponse { adventure })))
}

/// GET /adventures/{id}
#[instrument(skip(state))]
async fn get_adventure(
    State(state): State<AppState>,
    Path(adventure_id): Path<Uuid>,
) -> Result<Json<AdventureViewResponse>, ApiError> {
    let adventure =
        query_handlers::get_adventure_by_id(adventure_id, &*state.scenarios, &*state.adventures)
            .await?;
    Ok(Json(AdventureViewResponse { adventure }))
}

/// PUT /adventures/{id}
#[instrument(skip(state, request))]
async fn update_adventure(
    State(state): State<AppState>,
    Path(adventure_id): Path<Uuid>,
    Json(request): Json<UpdateAdventureRequest>,
) -> Result<Json<AdventureResponse>, ApiError> {
    let command = commands::UpdateAdventure {
        correlation_id: Uuid::new_v4(),
        adventure_id,
        title: request.title,
        current_story_summary: request.current_story_summary,
        memory: request.memory,
    };

    info!(correlation_id = %command.correlation_id, "handling update_adventure command");

    let adventure = command_handlers::handle_update_adventure(
        &command,
        state.clock.as_ref(),
        &*state.adventures,
    )
    .await?;

    Ok(Json(AdventureResponse { adventure }))
}

/// DELETE /adventures/{id}
#[instrument(skip(state))]
async fn delete_adventure(
    State(state): State<AppState>,
    Path(adventure_id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let command = commands::DeleteAdventure {
        correlation_id: Uuid::new_v4(),
        adventure_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_adventure command");

    command_handlers::handle_delete_adventure(&command, &*state.adventures).await?;

    Ok(Json(DeletedResponse {
        deleted: adventure_id,
    }))
}

/// POST /adventures/{id}/undo
#[instrument(skip(state))]
async fn undo_last_turn(
    State(state): State<AppState>,
    Path(adventure_id): Path<Uuid>,
) -> Result<Json<UndoResponse>, ApiError> {
    let command = commands::UndoLastTurn {
        correlation_id: Uuid::new_v4(),
        adventure_id,
    };

    info!(correlation_id = %command.correlation_id, "handling undo_last_turn command");

    let undone = command_handlers::handle_undo_last_turn(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
        &*state.adventures,
    )
    .await?;

    Ok(Json(UndoResponse { undone }))
}

/// Returns the router for the adventure lifecycle.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/adventures", get(list_adventures))
        .route("/scenarios/{id}/adventures", post(create_adventure))
        .route(
            "/adventures/{id}",
            get(get_adventure)
                .put(update_adventure)
                .delete(delete_adventure),
        )
        .route("/adventures/{id}/undo", post(undo_last_turn))
}
