//! Query handlers for the adventure lifecycle.

use chrono::{DateTime, Utc};
use lore_core::error::DomainError;
use lore_core::model::{Adventure, CharacterState, Scene, StoryEvent};
use lore_core::repository::{AdventureRepository, ScenarioRepository};
use serde::Serialize;
use uuid::Uuid;

/// Full read model of an adventure.
#[derive(Debug, Serialize)]
pub struct AdventureView {
    #[serde(flatten)]
    pub adventure: Adventure,
    /// Title of the scenario being played; empty if it has been removed.
    pub scenario_title: String,
    pub scene: Scene,
    pub character_states: Vec<CharacterState>,
    /// History in ascending sequence order.
    pub history: Vec<StoryEvent>,
}

/// Listing entry for an adventure.
#[derive(Debug, Serialize)]
pub struct AdventureSummary {
    pub id: Uuid,
    pub scenario_id: Uuid,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

impl From<Adventure> for AdventureSummary {
    fn from(adventure: Adventure) -> Self {
        Self {
            id: adventure.id,
            scenario_id: adventure.scenario_id,
            title: adventure.title,
            updated_at: adventure.updated_at,
        }
    }
}

/// Retrieves an adventure with its scene, character states and history.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the adventure does not exist.
pub async fn get_adventure_by_id(
    adventure_id: Uuid,
    scenarios: &dyn ScenarioRepository,
    adventures: &dyn AdventureRepository,
) -> Result<AdventureView, DomainError> {
    let adventure = adventures
        .get_adventure(adventure_id)
        .await?
        .ok_or_else(|| DomainError::not_found("adventure", adventure_id))?;
    let scenario_title = scenarios
        .get_scenario(adventure.scenario_id)
        .await?
        .map(|s| s.title)
        .unwrap_or_default();

    Ok(AdventureView {
        scene: adventures.get_scene(adventure_id).await?,
        character_states: adventures.list_character_states(adventure_id).await?,
        history: adventures.list_events(adventure_id).await?,
        scenario_title,
        adventure,
    })
}

/// Lists adventures, most recently played first, optionally for one
/// scenario.
///
/// # Errors
///
/// Returns a repository error if the listing fails.
pub async fn list_adventures(
    scenario_id: Option<Uuid>,
    adventures: &dyn AdventureRepository,
) -> Result<Vec<AdventureSummary>, DomainError> {
    Ok(adventures
        .list_adventures(scenario_id)
        .await?
        .into_iter()
        .map(AdventureSummary::from)
        .collect())
}
