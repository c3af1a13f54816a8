//! Lore API — HTTP surface of the story engine.
//!
//! Serves the JSON API under `/api/lore`, the free chat endpoint and the
//! server-rendered HTML fragments under `/lore`.

pub mod config;
pub mod error;
pub mod pages;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;

use crate::state::AppState;

/// Builds the complete application router for `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/lore", routes::api_router())
        .merge(routes::chat::router())
        .nest("/lore", pages::router())
        .with_state(state)
}
