//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use lore_core::clock::Clock;
use lore_llm::{LlmClient, LlmSettings, SharedLlmSettings};
use lore_narrative::application::command_handlers::TurnSettings;
use lore_narrative::domain::prompts::PromptSet;
use lore_store::{PgAdventureRepository, PgScenarioRepository};
use lore_test_support::{FixedClock, ScriptedLlmClient};
use sqlx::PgPool;
use tower::ServiceExt;

use lore_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock + Send + Sync> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build the full app router backed by the `PostgreSQL` repositories and a
/// model client with no scripted replies.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_llm(pool, ScriptedLlmClient::default())
}

/// Build the full app router with a custom model client, for tests that play
/// turns.
pub fn build_test_app_with_llm(pool: PgPool, llm: impl LlmClient + 'static) -> Router {
    let app_state = AppState::new(
        fixed_clock(),
        Arc::new(PgScenarioRepository::new(pool.clone())),
        Arc::new(PgAdventureRepository::new(pool)),
        Arc::new(llm),
        SharedLlmSettings::new(LlmSettings::default()),
        PromptSet::default(),
        TurnSettings::default(),
    );
    lore_api::app(app_state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a request with a JSON body and return the response.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(app, "POST", uri, body).await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response body as text.
pub async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8(body_bytes.to_vec()).unwrap())
}

/// Create a published scenario with a player character (Aria) and an NPC
/// (Mira) and return its id.
pub async fn create_scenario(pool: &PgPool) -> String {
    let (status, json) = post_json(
        build_test_app(pool.clone()),
        "/api/lore/scenarios",
        &serde_json::json!({
            "title": "Saltmere",
            "status": "published",
            "plot": { "story": "The bell tolls at dusk." },
            "story_cards": [
                { "name": "Aria", "type": "pc", "entry": "A cartographer." },
                { "name": "Mira", "type": "character", "entry": "The innkeeper.", "triggers": ["inn"] },
                { "name": "Gull's Rest", "type": "location", "triggers": ["inn"] }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["scenario"]["id"].as_str().unwrap().to_owned()
}

/// Create an adventure for `scenario_id` and return its id.
pub async fn create_adventure(pool: &PgPool, scenario_id: &str) -> String {
    let (status, json) = post_empty(
        build_test_app(pool.clone()),
        &format!("/api/lore/scenarios/{scenario_id}/adventures"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["adventure"]["id"].as_str().unwrap().to_owned()
}
