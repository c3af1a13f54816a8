//! Routes for scenario authoring.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use lore_core::model::{Plot, Scenario, ScenarioStatus, StoryCard};
use lore_scenario::application::{command_handlers, query_handlers};
use lore_scenario::domain::commands::{self, CardDraft, PlotUpdate};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::DeletedResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string for GET /scenarios.
#[derive(Debug, Deserialize)]
pub struct ListScenariosQuery {
    /// Only list scenarios with this status.
    pub status: Option<ScenarioStatus>,
}

/// Request body for POST /scenarios.
#[derive(Debug, Deserialize)]
pub struct CreateScenarioRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: ScenarioStatus,
    #[serde(default)]
    pub plot: Plot,
    /// Cards created together with the scenario, in order.
    #[serde(default)]
    pub story_cards: Vec<CardDraft>,
}

/// Request body for PUT /scenarios/{id}. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateScenarioRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ScenarioStatus>,
    pub plot: Option<PlotUpdate>,
}

/// Request body for POST /scenarios/import.
#[derive(Debug, Deserialize)]
pub struct ImportScenarioRequest {
    /// Markdown document with YAML front matter.
    pub source: String,
}

/// Query string for GET /scenarios/{id}/triggered-cards.
#[derive(Debug, Deserialize)]
pub struct TriggeredCardsQuery {
    /// Text scanned for card triggers.
    #[serde(default)]
    pub text: String,
}

/// Response body carrying one scenario with its cards.
#[derive(Debug, Serialize)]
pub struct ScenarioResponse {
    pub scenario: Scenario,
}

/// Response body for GET /scenarios.
#[derive(Debug, Serialize)]
pub struct ScenarioListResponse {
    pub scenarios: Vec<query_handlers::ScenarioSummary>,
}

/// Response body for POST /scenarios/import.
#[derive(Debug, Serialize)]
pub struct ImportScenarioResponse {
    pub scenario: Scenario,
    /// `false` when the same document had been imported before.
    pub created: bool,
}

/// Response body for GET /scenarios/{id}/triggered-cards.
#[derive(Debug, Serialize)]
pub struct TriggeredCardsResponse {
    pub cards: Vec<StoryCard>,
}

/// GET /scenarios
#[instrument(skip(state))]
async fn list_scenarios(
    State(state): State<AppState>,
    Query(query): Query<ListScenariosQuery>,
) -> Result<Json<ScenarioListResponse>, ApiError> {
    let scenarios = query_handlers::list_scenarios(query.status, &*state.scenarios).await?;
    Ok(Json(ScenarioListResponse { scenarios }))
}

/// POST /scenarios
#[instrument(skip(state, request), fields(title = %request.title))]
async fn create_scenario(
    State(state): State<AppState>,
    Json(request): Json<CreateScenarioRequest>,
) -> Result<(StatusCode, Json<ScenarioResponse>), ApiError> {
    let command = commands::CreateScenario {
        correlation_id: Uuid::new_v4(),
        title: request.title,
        description: request.description,
        tags: request.tags,
        status: request.status,
        plot: request.plot,
        story_cards: request.story_cards,
    };

    info!(correlation_id = %command.correlation_id, "handling create_scenario command");

    let scenario = command_handlers::handle_create_scenario(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ScenarioResponse { scenario })))
}

/// POST /scenarios/import
#[instrument(skip(state, request), fields(source_len = request.source.len()))]
async fn import_scenario(
    State(state): State<AppState>,
    Json(request): Json<ImportScenarioRequest>,
) -> Result<(StatusCode, Json<ImportScenarioResponse>), ApiError> {
    let command = commands::ImportScenario {
        correlation_id: Uuid::new_v4(),
        source: request.source,
    };

    info!(correlation_id = %command.correlation_id, "handling import_scenario command");

    let result = command_handlers::handle_import_scenario(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
    )
    .await?;

    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(ImportScenarioResponse {
            scenario: result.scenario,
            created: result.created,
        }),
    ))
}

/// GET /scenarios/{id}
#[instrument(skip(state))]
async fn get_scenario(
    State(state): State<AppState>,
    Path(scenario_id): Path<Uuid>,
) -> Result<Json<ScenarioResponse>, ApiError> {
    let scenario = query_handlers::get_scenario_by_id(scenario_id, &*state.scenarios).await?;
    Ok(Json(ScenarioResponse { scenario }))
}

/// PUT /scenarios/{id}
#[instrument(skip(state, request))]
async fn update_scenario(
    State(state): State<AppState>,
    Path(scenario_id): Path<Uuid>,
    Json(request): Json<UpdateScenarioRequest>,
) -> Result<Json<ScenarioResponse>, ApiError> {
    let command = commands::UpdateScenario {
        correlation_id: Uuid::new_v4(),
        scenario_id,
        title: request.title,
        description: request.description,
        tags: request.tags,
        status: request.status,
        plot: request.plot,
    };

    info!(correlation_id = %command.correlation_id, "handling update_scenario command");

    let scenario = command_handlers::handle_update_scenario(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
    )
    .await?;

    Ok(Json(ScenarioResponse { scenario }))
}

/// DELETE /scenarios/{id}
#[instrument(skip(state))]
async fn delete_scenario(
    State(state): State<AppState>,
    Path(scenario_id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let command = commands::DeleteScenario {
        correlation_id: Uuid::new_v4(),
        scenario_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_scenario command");

    command_handlers::handle_delete_scenario(&command, &*state.scenarios).await?;

    Ok(Json(DeletedResponse {
        deleted: scenario_id,
    }))
}

/// GET /scenarios/{id}/triggered-cards
#[instrument(skip(state, query))]
async fn triggered_cards(
    State(state): State<AppState>,
    Path(scenario_id): Path<Uuid>,
    Query(query): Query<TriggeredCardsQuery>,
) -> Result<Json<TriggeredCardsResponse>, ApiError> {
    let cards =
        query_handlers::get_triggered_cards(scenario_id, &query.text, &*state.scenarios).await?;
    Ok(Json(TriggeredCardsResponse { cards }))
}

/// Returns the router for scenario authoring.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/scenarios", get(list_scenarios).post(create_scenario))
        .route("/scenarios/import", post(import_scenario))
        .route(
            "/scenarios/{id}",
            get(get_scenario).put(update_scenario).delete(delete_scenario),
        )
        .route("/scenarios/{id}/triggered-cards", get(triggered_cards))
}

#[cfg(test)]
mod tests {
    use super::*;

    use lore_test_support::{FailingRepository, InMemoryStore, ScriptedLlmClient};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::routes::test_support::{app_state, empty_request, json_request, read_json, scenario};

    const IMPORT_DOCUMENT: &str = "---\ntitle: The Lantern Road\nstatus: published\n---\n\
        # Story\nA caravan sets out at dusk.\n";

    fn app(store: InMemoryStore) -> Router {
        router().with_state(app_state(store, ScriptedLlmClient::default()))
    }

    #[tokio::test]
    async fn test_create_scenario_returns_201_with_cards() {
        // Arrange
        let app = app(InMemoryStore::new());
        let body = serde_json::json!({
            "title": "Frostfall",
            "tags": ["winter"],
            "plot": { "story": "Snow buries the pass." },
            "story_cards": [
                { "name": "Kestra", "type": "pc" },
                { "name": "The Pass", "type": "location", "triggers": ["pass"] }
            ]
        });

        // Act
        let response = app
            .oneshot(json_request("POST", "/scenarios", &body))
            .await
            .unwrap();

        // Assert
        let (status, json) = read_json(response).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["scenario"]["title"], "Frostfall");
        assert_eq!(json["scenario"]["status"], "draft");
        assert_eq!(json["scenario"]["plot"]["story"], "Snow buries the pass.");
        assert_eq!(json["scenario"]["story_cards"][0]["type"], "pc");
        assert_eq!(json["scenario"]["story_cards"][1]["name"], "The Pass");
    }

    #[tokio::test]
    async fn test_create_scenario_with_blank_title_returns_400() {
        // Arrange
        let app = app(InMemoryStore::new());
        let body = serde_json::json!({ "title": "   " });

        // Act
        let response = app
            .oneshot(json_request("POST", "/scenarios", &body))
            .await
            .unwrap();

        // Assert
        let (status, json) = read_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_list_scenarios_filters_by_status() {
        // Arrange
        let published = scenario();
        let app = app(InMemoryStore::new().with_scenario(published.clone()));

        // Act
        let drafts = app
            .clone()
            .oneshot(empty_request("GET", "/scenarios?status=draft"))
            .await
            .unwrap();
        let listed = app
            .oneshot(empty_request("GET", "/scenarios?status=published"))
            .await
            .unwrap();

        // Assert
        let (_, drafts) = read_json(drafts).await;
        let (status, listed) = read_json(listed).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(drafts["scenarios"].as_array().unwrap().len(), 0);
        assert_eq!(listed["scenarios"][0]["id"], published.id.to_string());
    }

    #[tokio::test]
    async fn test_get_missing_scenario_returns_404() {
        // Arrange
        let app = app(InMemoryStore::new());

        // Act
        let response = app
            .oneshot(empty_request("GET", &format!("/scenarios/{}", Uuid::new_v4())))
            .await
            .unwrap();

        // Assert
        let (status, json) = read_json(response).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_update_scenario_changes_only_given_fields() {
        // Arrange
        let existing = scenario();
        let app = app(InMemoryStore::new().with_scenario(existing.clone()));
        let body = serde_json::json!({
            "status": "unavailable",
            "plot": { "authors_note": "Keep it tense." }
        });

        // Act
        let response = app
            .oneshot(json_request(
                "PUT",
                &format!("/scenarios/{}", existing.id),
                &body,
            ))
            .await
            .unwrap();

        // Assert
        let (status, json) = read_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["scenario"]["title"], existing.title);
        assert_eq!(json["scenario"]["status"], "unavailable");
        assert_eq!(json["scenario"]["plot"]["story"], existing.plot.story);
        assert_eq!(json["scenario"]["plot"]["authors_note"], "Keep it tense.");
    }

    #[tokio::test]
    async fn test_delete_scenario_then_get_returns_404() {
        // Arrange
        let existing = scenario();
        let app = app(InMemoryStore::new().with_scenario(existing.clone()));
        let uri = format!("/scenarios/{}", existing.id);

        // Act
        let deleted = app
            .clone()
            .oneshot(empty_request("DELETE", &uri))
            .await
            .unwrap();
        let fetched = app.oneshot(empty_request("GET", &uri)).await.unwrap();

        // Assert
        let (status, json) = read_json(deleted).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["deleted"], existing.id.to_string());
        assert_eq!(fetched.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_import_same_document_twice_reuses_scenario() {
        // Arrange
        let app = app(InMemoryStore::new());
        let body = serde_json::json!({ "source": IMPORT_DOCUMENT });

        // Act
        let first = app
            .clone()
            .oneshot(json_request("POST", "/scenarios/import", &body))
            .await
            .unwrap();
        let second = app
            .oneshot(json_request("POST", "/scenarios/import", &body))
            .await
            .unwrap();

        // Assert
        let (first_status, first) = read_json(first).await;
        let (second_status, second) = read_json(second).await;
        assert_eq!(first_status, StatusCode::CREATED);
        assert_eq!(first["created"], true);
        assert_eq!(first["scenario"]["title"], "The Lantern Road");
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(second["created"], false);
        assert_eq!(second["scenario"]["id"], first["scenario"]["id"]);
    }

    #[tokio::test]
    async fn test_triggered_cards_matches_text() {
        // Arrange
        let existing = scenario();
        let app = app(InMemoryStore::new().with_scenario(existing.clone()));

        // Act
        let response = app
            .oneshot(empty_request(
                "GET",
                &format!("/scenarios/{}/triggered-cards?text=Ask%20Borin", existing.id),
            ))
            .await
            .unwrap();

        // Assert
        let (status, json) = read_json(response).await;
        assert_eq!(status, StatusCode::OK);
        let cards = json["cards"].as_array().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0]["name"], "Borin");
    }

    #[tokio::test]
    async fn test_repository_failure_returns_500() {
        // Arrange
        let repo = Arc::new(FailingRepository);
        let mut state = app_state(InMemoryStore::new(), ScriptedLlmClient::default());
        state.scenarios = repo;
        let app = router().with_state(state);

        // Act
        let response = app.oneshot(empty_request("GET", "/scenarios")).await.unwrap();

        // Assert
        let (status, json) = read_json(response).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }
}
