//! HTTP route modules.

use axum::Router;
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;

pub mod adventures;
pub mod cards;
pub mod chat;
pub mod health;
pub mod play;
pub mod scenarios;
pub mod settings;

/// Returns the JSON API router, mounted under `/api/lore`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(scenarios::router())
        .merge(cards::router())
        .merge(adventures::router())
        .merge(play::router())
        .merge(settings::router())
}

/// Response body for a successful delete.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    /// Identifier of the removed entity.
    pub deleted: Uuid,
}
