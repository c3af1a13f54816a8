//! Commands for scenario authoring.

use lore_core::command::Command;
use lore_core::model::{Plot, ScenarioStatus, StoryCardType};
use serde::Deserialize;
use uuid::Uuid;

/// Fields of a story card supplied at creation time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardDraft {
    /// Card name; must be non-blank.
    pub name: String,
    /// Card type; defaults to `custom`.
    #[serde(default, rename = "type")]
    pub card_type: StoryCardType,
    /// Lore text injected into prompts when the card triggers.
    #[serde(default)]
    pub entry: String,
    /// Keywords that activate the card.
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Author-only notes.
    #[serde(default)]
    pub notes: String,
}

/// Partial change to a scenario's plot. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlotUpdate {
    pub story: Option<String>,
    pub ai_instructions: Option<String>,
    pub story_summary: Option<String>,
    pub plot_essentials: Option<String>,
    pub authors_note: Option<String>,
    pub third_person: Option<bool>,
}

impl PlotUpdate {
    /// Applies the present fields to `plot`.
    pub fn apply_to(&self, plot: &mut Plot) {
        let fields = [
            (&self.story, &mut plot.story),
            (&self.ai_instructions, &mut plot.ai_instructions),
            (&self.story_summary, &mut plot.story_summary),
            (&self.plot_essentials, &mut plot.plot_essentials),
            (&self.authors_note, &mut plot.authors_note),
        ];
        for (value, target) in fields {
            if let Some(value) = value {
                value.clone_into(target);
            }
        }
        if let Some(third_person) = self.third_person {
            plot.third_person = third_person;
        }
    }
}

/// Command to create a scenario, optionally with an initial set of cards.
#[derive(Debug, Clone)]
pub struct CreateScenario {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub status: ScenarioStatus,
    pub plot: Plot,
    pub story_cards: Vec<CardDraft>,
}

impl Command for CreateScenario {
    fn command_type(&self) -> &'static str {
        "scenario.create_scenario"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to change some of a scenario's fields.
#[derive(Debug, Clone, Default)]
pub struct UpdateScenario {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The scenario to change.
    pub scenario_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ScenarioStatus>,
    pub plot: Option<PlotUpdate>,
}

impl Command for UpdateScenario {
    fn command_type(&self) -> &'static str {
        "scenario.update_scenario"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to delete a scenario with its cards and adventures.
#[derive(Debug, Clone)]
pub struct DeleteScenario {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The scenario to delete.
    pub scenario_id: Uuid,
}

impl Command for DeleteScenario {
    fn command_type(&self) -> &'static str {
        "scenario.delete_scenario"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to add a story card to a scenario.
#[derive(Debug, Clone)]
pub struct CreateStoryCard {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The owning scenario.
    pub scenario_id: Uuid,
    /// The card to create.
    pub card: CardDraft,
}

impl Command for CreateStoryCard {
    fn command_type(&self) -> &'static str {
        "scenario.create_story_card"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to change some of a story card's fields.
#[derive(Debug, Clone, Default)]
pub struct UpdateStoryCard {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The card to change.
    pub card_id: Uuid,
    pub name: Option<String>,
    pub card_type: Option<StoryCardType>,
    pub entry: Option<String>,
    pub triggers: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl Command for UpdateStoryCard {
    fn command_type(&self) -> &'static str {
        "scenario.update_story_card"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to delete a story card.
#[derive(Debug, Clone)]
pub struct DeleteStoryCard {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The card to delete.
    pub card_id: Uuid,
}

impl Command for DeleteStoryCard {
    fn command_type(&self) -> &'static str {
        "scenario.delete_story_card"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to import a scenario from a Markdown document with YAML front
/// matter.
#[derive(Debug, Clone)]
pub struct ImportScenario {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The raw document.
    pub source: String,
}

impl Command for ImportScenario {
    fn command_type(&self) -> &'static str {
        "scenario.import_scenario"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_update_only_touches_present_fields() {
        // Arrange
        let mut plot = Plot {
            story: "Once upon a time".to_owned(),
            authors_note: "Keep it grim".to_owned(),
            ..Plot::default()
        };
        let update = PlotUpdate {
            authors_note: Some(String::new()),
            third_person: Some(true),
            ..PlotUpdate::default()
        };

        // Act
        update.apply_to(&mut plot);

        // Assert
        assert_eq!(plot.story, "Once upon a time");
        assert_eq!(plot.authors_note, "");
        assert!(plot.third_person);
    }

    #[test]
    fn test_card_draft_type_defaults_to_custom() {
        let draft: CardDraft = serde_yaml::from_str("name: The Old Mill").unwrap();

        assert_eq!(draft.card_type, StoryCardType::Custom);
        assert!(draft.triggers.is_empty());
    }
}
