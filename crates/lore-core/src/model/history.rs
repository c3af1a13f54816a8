//! Adventure history: player actions, character actions and recorded events.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

use super::scene::{Scene, SceneUpdate};

/// How the player's input should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// The player character performs an action.
    #[default]
    Do,
    /// The player character says something.
    Say,
    /// Direct narration written by the player.
    Story,
    /// Action and speech combined.
    DoSay,
}

impl ActionType {
    /// Every action type, in display order.
    pub const ALL: [Self; 4] = [Self::Do, Self::Say, Self::Story, Self::DoSay];

    /// Wire/database name of the action type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Do => "do",
            Self::Say => "say",
            Self::Story => "story",
            Self::DoSay => "do_say",
        }
    }

    /// Renders the player's input as prose for the story model.
    ///
    /// `actor` replaces "You" in third-person scenarios.
    #[must_use]
    pub fn format_input(self, input: &str, actor: Option<&str>) -> String {
        let input = input.trim();
        let subject = actor.unwrap_or("You");
        match self {
            Self::Do | Self::DoSay => format!("{subject} {input}"),
            Self::Say => {
                let verb = if actor.is_some() { "says" } else { "say" };
                format!("{subject} {verb}: \"{input}\"")
            }
            Self::Story => input.to_owned(),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown action type: {s}")))
    }
}

/// What one character did during a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterAction {
    /// Who acted.
    pub character_name: String,
    /// Physical action.
    pub action: String,
    /// Spoken dialogue, without quotes.
    pub speech: String,
    /// Internal monologue; shown to the author, not narrated.
    pub inner_thought: String,
    /// Whether the actor is a player character.
    pub is_pc: bool,
}

impl CharacterAction {
    /// Action followed by quoted speech, e.g. `She nods. "Welcome."`.
    #[must_use]
    pub fn to_narrative(&self) -> String {
        let mut parts = Vec::new();
        if !self.action.is_empty() {
            parts.push(self.action.clone());
        }
        if !self.speech.is_empty() {
            parts.push(format!("\"{}\"", self.speech));
        }
        parts.join(" ")
    }
}

/// One recorded turn of an adventure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryEvent {
    /// Event identifier.
    pub id: Uuid,
    /// Owning adventure.
    pub adventure_id: Uuid,
    /// Position in the adventure's history, starting at 1.
    pub sequence_number: i64,
    /// How the player's input was meant.
    pub action_type: ActionType,
    /// Who acted: the player character's name, or `narrator`.
    pub actor_name: String,
    /// Raw player input.
    pub player_input: String,
    /// Narration produced by the story model.
    pub narration: String,
    /// Character responses, in the order they were voiced.
    pub character_actions: Vec<CharacterAction>,
    /// Scene delta applied by this turn.
    pub scene_update: Option<SceneUpdate>,
    /// Scene after this turn; used to restore state on undo.
    pub scene_snapshot: Scene,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl StoryEvent {
    /// Narration plus every non-player character's narrative, blank-line
    /// separated.
    #[must_use]
    pub fn ai_response(&self) -> String {
        let mut parts = Vec::new();
        if !self.narration.is_empty() {
            parts.push(self.narration.clone());
        }
        for action in self.character_actions.iter().filter(|a| !a.is_pc) {
            let narrative = action.to_narrative();
            if !narrative.is_empty() {
                parts.push(format!("{}: {narrative}", action.character_name));
            }
        }
        parts.join("\n\n")
    }
}
