//! Shared application state.

use std::sync::Arc;

use lore_core::clock::Clock;
use lore_core::repository::{AdventureRepository, ScenarioRepository};
use lore_llm::{LlmClient, SharedLlmSettings};
use lore_narrative::application::command_handlers::TurnSettings;
use lore_narrative::domain::prompts::PromptSet;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for deterministic time.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// Scenario and story card storage.
    pub scenarios: Arc<dyn ScenarioRepository>,
    /// Adventure, scene, character state and history storage.
    pub adventures: Arc<dyn AdventureRepository>,
    /// Model backend for story direction and character voices.
    pub llm: Arc<dyn LlmClient>,
    /// Model selection, shared with the HTTP client so changes apply to the
    /// next request.
    pub llm_settings: SharedLlmSettings,
    /// System prompts.
    pub prompts: Arc<PromptSet>,
    /// Turn tunables.
    pub turn_settings: TurnSettings,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock + Send + Sync>,
        scenarios: Arc<dyn ScenarioRepository>,
        adventures: Arc<dyn AdventureRepository>,
        llm: Arc<dyn LlmClient>,
        llm_settings: SharedLlmSettings,
        prompts: PromptSet,
        turn_settings: TurnSettings,
    ) -> Self {
        Self {
            clock,
            scenarios,
            adventures,
            llm,
            llm_settings,
            prompts: Arc::new(prompts),
            turn_settings,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("llm_settings", &self.llm_settings)
            .field("turn_settings", &self.turn_settings)
            .finish_non_exhaustive()
    }
}
