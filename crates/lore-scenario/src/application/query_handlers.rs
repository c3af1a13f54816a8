//! Query handlers for scenario authoring.

use chrono::{DateTime, Utc};
use lore_core::error::DomainError;
use lore_core::model::{Scenario, ScenarioStatus, StoryCard};
use lore_core::repository::ScenarioRepository;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::triggers::triggered_cards;

/// Listing entry for a scenario (cards omitted).
#[derive(Debug, Serialize)]
pub struct ScenarioSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub status: ScenarioStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<Scenario> for ScenarioSummary {
    fn from(scenario: Scenario) -> Self {
        Self {
            id: scenario.id,
            title: scenario.title,
            description: scenario.description,
            tags: scenario.tags,
            status: scenario.status,
            updated_at: scenario.updated_at,
        }
    }
}

/// Retrieves a scenario with its story cards.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the scenario does not exist.
pub async fn get_scenario_by_id(
    scenario_id: Uuid,
    repo: &dyn ScenarioRepository,
) -> Result<Scenario, DomainError> {
    repo.get_scenario(scenario_id)
        .await?
        .ok_or_else(|| DomainError::not_found("scenario", scenario_id))
}

/// Lists scenarios, most recently updated first, optionally filtered by
/// status.
///
/// # Errors
///
/// Returns a repository error if the listing fails.
pub async fn list_scenarios(
    status: Option<ScenarioStatus>,
    repo: &dyn ScenarioRepository,
) -> Result<Vec<ScenarioSummary>, DomainError> {
    Ok(repo
        .list_scenarios(status)
        .await?
        .into_iter()
        .map(ScenarioSummary::from)
        .collect())
}

/// Retrieves a single story card.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the card does not exist.
pub async fn get_story_card_by_id(
    card_id: Uuid,
    repo: &dyn ScenarioRepository,
) -> Result<StoryCard, DomainError> {
    repo.get_card(card_id)
        .await?
        .ok_or_else(|| DomainError::not_found("story_card", card_id))
}

/// Story cards of a scenario triggered by `text`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the scenario does not exist.
pub async fn get_triggered_cards(
    scenario_id: Uuid,
    text: &str,
    repo: &dyn ScenarioRepository,
) -> Result<Vec<StoryCard>, DomainError> {
    let scenario = get_scenario_by_id(scenario_id, repo).await?;
    Ok(triggered_cards::<&str>(&scenario.story_cards, text, &[])
        .into_iter()
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use lore_core::model::{Plot, StoryCardType};
    use lore_test_support::{FailingRepository, FixedClock, InMemoryStore, fixed_time};

    use super::*;
    use crate::application::command_handlers::handle_create_scenario;
    use crate::domain::commands::{CardDraft, CreateScenario};

    fn scenario(title: &str, status: ScenarioStatus) -> Scenario {
        Scenario {
            id: Uuid::new_v4(),
            title: title.to_owned(),
            description: String::new(),
            tags: Vec::new(),
            status,
            plot: Plot::default(),
            story_cards: Vec::new(),
            source_hash: None,
            created_at: fixed_time(),
            updated_at: fixed_time(),
        }
    }

    #[tokio::test]
    async fn test_list_scenarios_filters_by_status() {
        // Arrange
        let repo = InMemoryStore::new()
            .with_scenario(scenario("Draft one", ScenarioStatus::Draft))
            .with_scenario(scenario("Live one", ScenarioStatus::Published));

        // Act
        let published = list_scenarios(Some(ScenarioStatus::Published), &repo)
            .await
            .unwrap();
        let all = list_scenarios(None, &repo).await.unwrap();

        // Assert
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].title, "Live one");
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_get_scenario_by_id_returns_not_found() {
        let result = get_scenario_by_id(Uuid::new_v4(), &InMemoryStore::new()).await;

        assert!(matches!(result, Err(DomainError::NotFound { entity: "scenario", .. })));
    }

    #[tokio::test]
    async fn test_get_triggered_cards_matches_keywords() {
        // Arrange
        let repo = InMemoryStore::new();
        let command = CreateScenario {
            correlation_id: Uuid::new_v4(),
            title: "Saltmere".to_owned(),
            description: String::new(),
            tags: Vec::new(),
            status: ScenarioStatus::Draft,
            plot: Plot::default(),
            story_cards: vec![
                CardDraft {
                    name: "Harbor".to_owned(),
                    card_type: StoryCardType::Location,
                    triggers: vec!["docks".to_owned()],
                    ..CardDraft::default()
                },
                CardDraft {
                    name: "Bell".to_owned(),
                    triggers: vec!["bell".to_owned()],
                    ..CardDraft::default()
                },
            ],
        };
        let created = handle_create_scenario(&command, &FixedClock::default(), &repo)
            .await
            .unwrap();

        // Act
        let cards = get_triggered_cards(created.id, "I head to the docks", &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name, "Harbor");
    }

    #[tokio::test]
    async fn test_list_scenarios_propagates_repository_failure() {
        let result = list_scenarios(None, &FailingRepository).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
