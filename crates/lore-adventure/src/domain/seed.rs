//! Starting state of a new adventure.

use lore_core::model::{CharacterState, Scenario, Scene, StoryCardType};
use uuid::Uuid;

/// The scene an adventure opens with: every player character present and
/// nothing else known yet.
#[must_use]
pub fn initial_scene(scenario: &Scenario) -> Scene {
    Scene::with_characters(
        scenario
            .cards_of(StoryCardType::PlayingCharacter)
            .map(|card| card.name.clone()),
    )
}

/// One character state per `pc` or `character` card, in card order.
/// Duplicate names keep the first card.
#[must_use]
pub fn seed_character_states(adventure_id: Uuid, scenario: &Scenario) -> Vec<CharacterState> {
    let mut states: Vec<CharacterState> = Vec::new();
    for card in scenario
        .story_cards
        .iter()
        .filter(|card| card.card_type.is_character())
    {
        if states.iter().any(|s| s.has_name(&card.name)) {
            continue;
        }
        states.push(CharacterState::from_card(adventure_id, card));
    }
    states
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use lore_core::model::{Plot, ScenarioStatus, StoryCard};

    use super::*;

    fn scenario_with(cards: &[(&str, StoryCardType)]) -> Scenario {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let id = Uuid::new_v4();
        Scenario {
            id,
            title: "Saltmere".to_owned(),
            description: String::new(),
            tags: Vec::new(),
            status: ScenarioStatus::Draft,
            plot: Plot::default(),
            story_cards: cards
                .iter()
                .map(|(name, card_type)| StoryCard {
                    id: Uuid::new_v4(),
                    scenario_id: id,
                    card_type: *card_type,
                    name: (*name).to_owned(),
                    entry: String::new(),
                    triggers: Vec::new(),
                    notes: String::new(),
                    created_at: now,
                    updated_at: now,
                })
                .collect(),
            source_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_initial_scene_lists_only_player_characters() {
        let scenario = scenario_with(&[
            ("Aria", StoryCardType::PlayingCharacter),
            ("Mira", StoryCardType::Character),
            ("Harbor", StoryCardType::Location),
        ]);

        let scene = initial_scene(&scenario);

        assert_eq!(scene.characters_present, vec!["Aria"]);
        assert!(scene.location_name.is_empty());
    }

    #[test]
    fn test_seed_character_states_covers_character_cards_once() {
        // Arrange
        let scenario = scenario_with(&[
            ("Aria", StoryCardType::PlayingCharacter),
            ("Mira", StoryCardType::Character),
            ("mira", StoryCardType::Character),
            ("Harbor", StoryCardType::Location),
        ]);
        let adventure_id = Uuid::new_v4();

        // Act
        let states = seed_character_states(adventure_id, &scenario);

        // Assert
        let names: Vec<(&str, bool)> = states
            .iter()
            .map(|s| (s.character_name.as_str(), s.is_pc))
            .collect();
        assert_eq!(names, vec![("Aria", true), ("Mira", false)]);
        assert!(states.iter().all(|s| s.adventure_id == adventure_id));
        assert_eq!(states[1].card_id, Some(scenario.story_cards[1].id));
    }
}
