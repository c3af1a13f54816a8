//! Free-form chat with the story model.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use lore_narrative::application::command_handlers;
use lore_narrative::domain::commands;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /api/chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Replaces the default chat system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Response body for POST /api/chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /api/chat
#[instrument(skip(state, request))]
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let command = commands::Chat {
        correlation_id: Uuid::new_v4(),
        message: request.message,
        system_prompt: request.system_prompt,
    };

    info!(correlation_id = %command.correlation_id, "handling chat command");

    let response = command_handlers::handle_chat(&command, &*state.llm, &state.prompts).await?;

    Ok(Json(ChatResponse { response }))
}

/// Returns the chat router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat", post(chat))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::StatusCode;
    use lore_test_support::{FailingLlmClient, InMemoryStore, ScriptedLlmClient};
    use tower::ServiceExt;

    use crate::routes::test_support::{app_state, json_request, read_json};

    #[tokio::test]
    async fn test_chat_returns_model_reply() {
        // Arrange
        let llm = ScriptedLlmClient::new(["The tide waits for no one."]);
        let app = router().with_state(app_state(InMemoryStore::new(), llm));
        let body = serde_json::json!({ "message": "Tell me about tides." });

        // Act
        let response = app
            .oneshot(json_request("POST", "/api/chat", &body))
            .await
            .unwrap();

        // Assert
        let (status, json) = read_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], "The tide waits for no one.");
    }

    #[tokio::test]
    async fn test_chat_with_blank_message_returns_400() {
        let app = router().with_state(app_state(InMemoryStore::new(), FailingLlmClient));
        let body = serde_json::json!({ "message": "" });

        let response = app
            .oneshot(json_request("POST", "/api/chat", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
