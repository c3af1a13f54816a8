//! Per-adventure character state and the updates the story model proposes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::DomainError;

use super::name::same_name;
use super::scenario::{StoryCard, StoryCardType};

/// A stack of items carried by a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Item name; stacks are keyed by it.
    pub name: String,
    /// Optional flavour text.
    #[serde(default)]
    pub description: String,
    /// Number of units held.
    pub quantity: u32,
}

/// How one character regards another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relationship {
    /// Friendly, wary, hostile, ...
    pub attitude: String,
    /// Free-form notes.
    pub notes: String,
}

/// Dynamic state of a character during one adventure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    /// Row identifier.
    pub id: Uuid,
    /// Owning adventure.
    pub adventure_id: Uuid,
    /// Character name, unique within the adventure.
    pub character_name: String,
    /// Story card this state was seeded from.
    #[serde(default)]
    pub card_id: Option<Uuid>,
    /// Player character flag. Player characters are never voiced by the model.
    #[serde(default)]
    pub is_pc: bool,
    /// Personality traits ("brave", "curious", ...).
    #[serde(default)]
    pub personality_traits: Vec<String>,
    /// What the character cares about.
    #[serde(default)]
    pub values: Vec<String>,
    /// What the character fears.
    #[serde(default)]
    pub fears: Vec<String>,
    /// How the character talks.
    #[serde(default)]
    pub speech_style: String,
    /// Current emotional state.
    #[serde(default)]
    pub current_mood: String,
    /// What the character is trying to do right now.
    #[serde(default)]
    pub current_goal: String,
    /// Longer-running ambitions.
    #[serde(default)]
    pub long_term_goals: Vec<String>,
    /// Carried items.
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    /// Names of equipped items.
    #[serde(default)]
    pub equipped: Vec<String>,
    /// Relationships keyed by the other character's name.
    #[serde(default)]
    pub relationships: BTreeMap<String, Relationship>,
    /// Free-form game stats (`health`, `mana`, ...).
    #[serde(default)]
    pub stats: BTreeMap<String, serde_json::Value>,
    /// Short summary of what the character did most recently.
    #[serde(default)]
    pub recent_actions_summary: String,
}

/// Change to a character proposed by the story model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterUpdate {
    /// New mood.
    #[serde(alias = "mood", skip_serializing_if = "Option::is_none")]
    pub current_mood: Option<String>,
    /// New immediate goal.
    #[serde(alias = "goal", skip_serializing_if = "Option::is_none")]
    pub current_goal: Option<String>,
    /// Items picked up this turn.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items_gained: Vec<String>,
    /// Items lost or used up this turn.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items_lost: Vec<String>,
}

impl CharacterState {
    /// Blank state for a character that has no card.
    #[must_use]
    pub fn new(adventure_id: Uuid, character_name: impl Into<String>, is_pc: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            adventure_id,
            character_name: character_name.into(),
            card_id: None,
            is_pc,
            personality_traits: Vec::new(),
            values: Vec::new(),
            fears: Vec::new(),
            speech_style: String::new(),
            current_mood: String::new(),
            current_goal: String::new(),
            long_term_goals: Vec::new(),
            inventory: Vec::new(),
            equipped: Vec::new(),
            relationships: BTreeMap::new(),
            stats: BTreeMap::new(),
            recent_actions_summary: String::new(),
        }
    }

    /// Seeds a state from a character or player-character card.
    #[must_use]
    pub fn from_card(adventure_id: Uuid, card: &StoryCard) -> Self {
        let mut state = Self::new(
            adventure_id,
            card.name.trim(),
            card.card_type == StoryCardType::PlayingCharacter,
        );
        state.card_id = Some(card.id);
        state
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        same_name(&self.character_name, name)
    }

    /// Personality summary for prompts, e.g. `Traits: brave; Fears: fire`.
    #[must_use]
    pub fn describe_personality(&self) -> String {
        let mut parts = Vec::new();
        if !self.personality_traits.is_empty() {
            parts.push(format!("Traits: {}", self.personality_traits.join(", ")));
        }
        if !self.values.is_empty() {
            parts.push(format!("Values: {}", self.values.join(", ")));
        }
        if !self.fears.is_empty() {
            parts.push(format!("Fears: {}", self.fears.join(", ")));
        }
        if !self.speech_style.is_empty() {
            parts.push(format!("Speech style: {}", self.speech_style));
        }
        parts.join("; ")
    }

    /// Current-state summary for prompts, e.g. `Mood: wary; Goal: escape`.
    #[must_use]
    pub fn describe_state(&self) -> String {
        let mut parts = Vec::new();
        if !self.current_mood.is_empty() {
            parts.push(format!("Mood: {}", self.current_mood));
        }
        if !self.current_goal.is_empty() {
            parts.push(format!("Goal: {}", self.current_goal));
        }
        if !self.equipped.is_empty() {
            parts.push(format!("Equipped: {}", self.equipped.join(", ")));
        }
        parts.join("; ")
    }

    /// Adds `quantity` units of an item, stacking onto an existing entry.
    pub fn add_item(&mut self, name: &str, description: &str, quantity: u32) {
        if let Some(item) = self.inventory.iter_mut().find(|i| i.name == name) {
            item.quantity = item.quantity.saturating_add(quantity);
            return;
        }
        self.inventory.push(InventoryItem {
            name: name.to_owned(),
            description: description.to_owned(),
            quantity,
        });
    }

    /// Removes `quantity` units of an item. Removing the last unit also
    /// unequips it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the item is missing or there are
    /// fewer than `quantity` units.
    pub fn remove_item(&mut self, name: &str, quantity: u32) -> Result<(), DomainError> {
        let Some(index) = self.inventory.iter().position(|i| i.name == name) else {
            return Err(DomainError::Validation(format!(
                "{} does not carry {name}",
                self.character_name
            )));
        };
        let item = &mut self.inventory[index];
        if item.quantity < quantity {
            return Err(DomainError::Validation(format!(
                "{} carries only {} of {name}",
                self.character_name, item.quantity
            )));
        }
        item.quantity -= quantity;
        if item.quantity == 0 {
            self.inventory.remove(index);
            self.equipped.retain(|e| e != name);
        }
        Ok(())
    }

    /// Applies a model-proposed update. Losing an item the character does not
    /// have is logged and skipped.
    pub fn apply(&mut self, update: &CharacterUpdate) {
        if let Some(mood) = update.current_mood.as_deref().map(str::trim) {
            if !mood.is_empty() {
                mood.clone_into(&mut self.current_mood);
            }
        }
        if let Some(goal) = update.current_goal.as_deref().map(str::trim) {
            if !goal.is_empty() {
                goal.clone_into(&mut self.current_goal);
            }
        }
        for item in update.items_gained.iter().map(|i| i.trim()).filter(|i| !i.is_empty()) {
            self.add_item(item, "", 1);
        }
        for item in update.items_lost.iter().map(|i| i.trim()).filter(|i| !i.is_empty()) {
            if let Err(e) = self.remove_item(item, 1) {
                warn!(character = %self.character_name, error = %e, "ignoring item loss");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aria() -> CharacterState {
        CharacterState::new(Uuid::new_v4(), "Aria", true)
    }

    #[test]
    fn test_add_item_stacks_by_name() {
        let mut state = aria();

        state.add_item("torch", "A pitch torch", 1);
        state.add_item("torch", "", 2);

        assert_eq!(state.inventory.len(), 1);
        assert_eq!(state.inventory[0].quantity, 3);
        assert_eq!(state.inventory[0].description, "A pitch torch");
    }

    #[test]
    fn test_remove_last_unit_unequips_item() {
        // Arrange
        let mut state = aria();
        state.add_item("sword", "", 1);
        state.equipped.push("sword".to_owned());

        // Act
        state.remove_item("sword", 1).unwrap();

        // Assert
        assert!(state.inventory.is_empty());
        assert!(state.equipped.is_empty());
    }

    #[test]
    fn test_remove_more_than_held_fails_without_change() {
        let mut state = aria();
        state.add_item("arrow", "", 2);

        let result = state.remove_item("arrow", 5);

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(state.inventory[0].quantity, 2);
    }

    #[test]
    fn test_apply_ignores_blank_fields_and_missing_items() {
        // Arrange
        let mut state = aria();
        state.current_mood = "calm".to_owned();
        let update = CharacterUpdate {
            current_mood: Some("  ".to_owned()),
            current_goal: Some("find the map".to_owned()),
            items_gained: vec!["map".to_owned()],
            items_lost: vec!["lantern".to_owned()],
        };

        // Act
        state.apply(&update);

        // Assert
        assert_eq!(state.current_mood, "calm");
        assert_eq!(state.current_goal, "find the map");
        assert_eq!(state.inventory.len(), 1);
        assert_eq!(state.inventory[0].name, "map");
    }

    #[test]
    fn test_describe_personality_joins_labelled_parts() {
        let mut state = aria();
        state.personality_traits = vec!["brave".to_owned(), "stubborn".to_owned()];
        state.speech_style = "clipped".to_owned();

        assert_eq!(
            state.describe_personality(),
            "Traits: brave, stubborn; Speech style: clipped"
        );
        assert_eq!(state.describe_state(), "");
    }

    #[test]
    fn test_update_accepts_short_aliases() {
        let update: CharacterUpdate =
            serde_json::from_str(r#"{"mood": "angry", "goal": "revenge"}"#).unwrap();

        assert_eq!(update.current_mood.as_deref(), Some("angry"));
        assert_eq!(update.current_goal.as_deref(), Some("revenge"));
    }
}
