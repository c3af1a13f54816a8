//! Routes for story cards.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use lore_core::model::{StoryCard, StoryCardType};
use lore_scenario::application::{command_handlers, query_handlers};
use lore_scenario::domain::commands::{self, CardDraft};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::DeletedResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for PUT /cards/{id}. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCardRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub card_type: Option<StoryCardType>,
    pub entry: Option<String>,
    pub triggers: Option<Vec<String>>,
    pub notes: Option<String>,
}

/// Response body carrying one story card.
#[derive(Debug, Serialize)]
pub struct CardResponse {
    pub card: StoryCard,
}

/// POST /scenarios/{id}/cards
#[instrument(skip(state, request), fields(card_name = %request.name))]
async fn create_card(
    State(state): State<AppState>,
    Path(scenario_id): Path<Uuid>,
    Json(request): Json<CardDraft>,
) -> Result<(StatusCode, Json<CardResponse>), ApiError> {
    let command = commands::CreateStoryCard {
        correlation_id: Uuid::new_v4(),
        scenario_id,
        card: request,
    };

    info!(correlation_id = %command.correlation_id, "handling create_story_card command");

    let card = command_handlers::handle_create_story_card(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(CardResponse { card })))
}

/// GET /cards/{id}
#[instrument(skip(state))]
async fn get_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardResponse>, ApiError> {
    let card = query_handlers::get_story_card_by_id(card_id, &*state.scenarios).await?;
    Ok(Json(CardResponse { card }))
}

/// PUT /cards/{id}
#[instrument(skip(state, request))]
async fn update_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Json(request): Json<UpdateCardRequest>,
) -> Result<Json<CardResponse>, ApiError> {
    let command = commands::UpdateStoryCard {
        correlation_id: Uuid::new_v4(),
        card_id,
        name: request.name,
        card_type: request.card_type,
        entry: request.entry,
        triggers: request.triggers,
        notes: request.notes,
    };

    info!(correlation_id = %command.correlation_id, "handling update_story_card command");

    let card = command_handlers::handle_update_story_card(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
    )
    .await?;

    Ok(Json(CardResponse { card }))
}

/// DELETE /cards/{id}
#[instrument(skip(state))]
async fn delete_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let command = commands::DeleteStoryCard {
        correlation_id: Uuid::new_v4(),
        card_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_story_card command");

    command_handlers::handle_delete_story_card(&command, &*state.scenarios).await?;

    Ok(Json(DeletedResponse { deleted: card_id }))
}

/// Returns the router for story cards.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/scenarios/{id}/cards", post(create_card))
        .route(
            "/cards/{id}",
            get(get_card).put(update_card).delete(delete_card),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    use lore_test_support::{InMemoryStore, ScriptedLlmClient};
    use tower::ServiceExt;

    use crate::routes::test_support::{app_state, empty_request, json_request, read_json, scenario};

    fn app(store: InMemoryStore) -> Router {
        router().with_state(app_state(store, ScriptedLlmClient::default()))
    }

    #[tokio::test]
    async fn test_create_card_defaults_type_to_custom() {
        // Arrange
        let existing = scenario();
        let app = app(InMemoryStore::new().with_scenario(existing.clone()));
        let body = serde_json::json!({ "name": "Tide Tables", "entry": "High water at noon." });

        // Act
        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/scenarios/{}/cards", existing.id),
                &body,
            ))
            .await
            .unwrap();

        // Assert
        let (status, json) = read_json(response).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["card"]["type"], "custom");
        assert_eq!(json["card"]["scenario_id"], existing.id.to_string());
    }

    #[tokio::test]
    async fn test_create_card_for_missing_scenario_returns_404() {
        // Arrange
        let app = app(InMemoryStore::new());
        let body = serde_json::json!({ "name": "Orphan" });

        // Act
        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/scenarios/{}/cards", Uuid::new_v4()),
                &body,
            ))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_card_changes_type_and_triggers() {
        // Arrange
        let existing = scenario();
        let card_id = existing.story_cards[1].id;
        let app = app(InMemoryStore::new().with_scenario(existing));
        let body = serde_json::json!({ "type": "faction", "triggers": ["guild"] });

        // Act
        let response = app
            .oneshot(json_request("PUT", &format!("/cards/{card_id}"), &body))
            .await
            .unwrap();

        // Assert
        let (status, json) = read_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["card"]["name"], "Borin");
        assert_eq!(json["card"]["type"], "faction");
        assert_eq!(json["card"]["triggers"], serde_json::json!(["guild"]));
    }

    #[tokio::test]
    async fn test_delete_card_twice_returns_404_second_time() {
        // Arrange
        let existing = scenario();
        let card_id = existing.story_cards[0].id;
        let app = app(InMemoryStore::new().with_scenario(existing));
        let uri = format!("/cards/{card_id}");

        // Act
        let first = app
            .clone()
            .oneshot(empty_request("DELETE", &uri))
            .await
            .unwrap();
        let second = app.oneshot(empty_request("DELETE", &uri)).await.unwrap();

        // Assert
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::NOT_FOUND);
    }
}
