//! Scenarios, plots and story cards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

use super::name::same_name;

/// Publication status of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// Work in progress; the default.
    #[default]
    Draft,
    /// Listed and playable.
    Published,
    /// Hidden from listings.
    Unavailable,
}

impl ScenarioStatus {
    /// Every status, in display order.
    pub const ALL: [Self; 3] = [Self::Draft, Self::Published, Self::Unavailable];

    /// Wire/database name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown scenario status: {s}")))
    }
}

/// Kind of story card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StoryCardType {
    /// Non-player character, voiced by the character model.
    #[serde(rename = "character")]
    Character,
    /// Player character, controlled by the user.
    #[serde(rename = "pc")]
    PlayingCharacter,
    /// A place.
    #[serde(rename = "location")]
    Location,
    /// An object.
    #[serde(rename = "item")]
    Item,
    /// A character class.
    #[serde(rename = "class")]
    Class,
    /// A race or species.
    #[serde(rename = "race")]
    Race,
    /// An organisation.
    #[serde(rename = "faction")]
    Faction,
    /// Anything else; the default.
    #[default]
    #[serde(rename = "custom")]
    Custom,
}

impl StoryCardType {
    /// Every card type, in display order.
    pub const ALL: [Self; 8] = [
        Self::Character,
        Self::PlayingCharacter,
        Self::Location,
        Self::Item,
        Self::Class,
        Self::Race,
        Self::Faction,
        Self::Custom,
    ];

    /// Wire/database name of the card type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::PlayingCharacter => "pc",
            Self::Location => "location",
            Self::Item => "item",
            Self::Class => "class",
            Self::Race => "race",
            Self::Faction => "faction",
            Self::Custom => "custom",
        }
    }

    /// Whether cards of this type get a `CharacterState` in an adventure.
    #[must_use]
    pub fn is_character(self) -> bool {
        matches!(self, Self::Character | Self::PlayingCharacter)
    }
}

impl fmt::Display for StoryCardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryCardType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|card_type| card_type.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown story card type: {s}")))
    }
}

/// Initial state and standing instructions of a scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Plot {
    /// Opening prose the adventure starts from.
    pub story: String,
    /// Standing instructions for the story model.
    pub ai_instructions: String,
    /// Seed for an adventure's running summary.
    pub story_summary: String,
    /// Facts that must always stay in context.
    pub plot_essentials: String,
    /// Style and tone guidance.
    pub authors_note: String,
    /// Narrate in third person instead of second.
    pub third_person: bool,
}

/// A piece of world knowledge injected into context when triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryCard {
    /// Card identifier.
    pub id: Uuid,
    /// Owning scenario.
    pub scenario_id: Uuid,
    /// Card kind.
    #[serde(rename = "type")]
    pub card_type: StoryCardType,
    /// Display name; also the character name for character cards.
    pub name: String,
    /// Text injected into the story context.
    pub entry: String,
    /// Keywords that pull this card into context.
    pub triggers: Vec<String>,
    /// Author notes, also shown to the character model.
    pub notes: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl StoryCard {
    /// Returns `true` when any non-blank trigger occurs in `text`, ignoring case.
    #[must_use]
    pub fn is_triggered_by(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.triggers
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .any(|t| haystack.contains(&t.to_lowercase()))
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        same_name(&self.name, name)
    }
}

/// Blueprint for adventures: plot, tags and story cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario identifier.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Short description shown in listings.
    pub description: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Publication status.
    pub status: ScenarioStatus,
    /// Plot settings.
    pub plot: Plot,
    /// Story cards, in creation order. Empty in list views.
    #[serde(default)]
    pub story_cards: Vec<StoryCard>,
    /// SHA-256 of the Markdown document this scenario was imported from.
    #[serde(default)]
    pub source_hash: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Scenario {
    /// Cards of the given type, in card order.
    pub fn cards_of(&self, card_type: StoryCardType) -> impl Iterator<Item = &StoryCard> {
        self.story_cards
            .iter()
            .filter(move |c| c.card_type == card_type)
    }

    /// Finds a character or player-character card by name, ignoring case.
    #[must_use]
    pub fn character_card(&self, name: &str) -> Option<&StoryCard> {
        self.story_cards
            .iter()
            .find(|c| c.card_type.is_character() && c.has_name(name))
    }

    /// Name of the first player-character card, if any.
    #[must_use]
    pub fn player_character_name(&self) -> Option<&str> {
        self.cards_of(StoryCardType::PlayingCharacter)
            .next()
            .map(|c| c.name.as_str())
    }
}
