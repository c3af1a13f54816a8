//! The story director's per-turn decision.

use std::collections::BTreeMap;

use lore_core::model::{CharacterState, CharacterUpdate, Scenario, SceneUpdate, StoryCardType};
use serde_json::{Map, Value};
use tracing::debug;

use super::lenient::{json_objects, strip_code_fences};

const NARRATION_KEYS: [&str; 3] = ["narration", "narrative", "story"];
const RESPONDER_KEYS: [&str; 4] = [
    "responding_characters",
    "responders",
    "who_responds",
    "characters",
];
const SCENE_KEYS: [&str; 2] = ["scene_update", "scene"];

/// What the story director wants to happen this turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrchestratorDecision {
    /// Narration shown to the player.
    pub narration: String,
    /// Characters asked to respond, as named by the model (unresolved).
    pub responding_characters: Vec<String>,
    /// Scene delta, if the model proposed a non-empty one.
    pub scene_update: Option<SceneUpdate>,
    /// Mood, goal and inventory changes keyed by character name.
    pub character_updates: BTreeMap<String, CharacterUpdate>,
}

impl OrchestratorDecision {
    /// A decision consisting only of narration.
    #[must_use]
    pub fn narration_only(narration: impl Into<String>) -> Self {
        Self {
            narration: narration.into(),
            ..Self::default()
        }
    }
}

fn first_of<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

fn narration_of(object: &Map<String, Value>) -> Option<String> {
    NARRATION_KEYS
        .iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_owned)
}

fn responders_of(object: &Map<String, Value>) -> Vec<String> {
    let Some(Value::Array(items)) = first_of(object, &RESPONDER_KEYS) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(name.as_str()),
            Value::Object(entry) => entry.get("name").and_then(Value::as_str),
            _ => None,
        })
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

fn scene_update_of(object: &Map<String, Value>) -> Option<SceneUpdate> {
    first_of(object, &SCENE_KEYS)
        .and_then(|value| serde_json::from_value::<SceneUpdate>(value.clone()).ok())
        .filter(|update| !update.is_empty())
}

fn character_updates_of(object: &Map<String, Value>) -> BTreeMap<String, CharacterUpdate> {
    let Some(Value::Object(updates)) = object.get("character_updates") else {
        return BTreeMap::new();
    };
    updates
        .iter()
        .filter_map(|(name, value)| {
            serde_json::from_value::<CharacterUpdate>(value.clone())
                .ok()
                .map(|update| (name.trim().to_owned(), update))
        })
        .collect()
}

/// Parses the director's reply. Never fails.
///
/// Takes the first JSON object carrying a non-blank narration (under any of
/// its accepted names). Without one, the whole reply, fences stripped,
/// becomes the narration.
#[must_use]
pub fn parse_decision(raw: &str) -> OrchestratorDecision {
    for object in json_objects(raw) {
        if let Some(narration) = narration_of(&object) {
            return OrchestratorDecision {
                narration,
                responding_characters: responders_of(&object),
                scene_update: scene_update_of(&object),
                character_updates: character_updates_of(&object),
            };
        }
    }
    debug!("director reply carried no usable JSON; using it as narration");
    OrchestratorDecision::narration_only(strip_code_fences(raw))
}

/// Maps the requested responder names onto known non-player characters.
///
/// Names match NPC cards and non-PC character states case-insensitively and
/// resolve to the canonical spelling (card first). Player characters and
/// unknown names are dropped, duplicates removed, order kept, and at most
/// `max_responders` names returned.
#[must_use]
pub fn resolve_responders(
    requested: &[String],
    scenario: &Scenario,
    states: &[CharacterState],
    max_responders: usize,
) -> Vec<String> {
    let is_player = |name: &str| {
        scenario
            .cards_of(StoryCardType::PlayingCharacter)
            .any(|card| card.has_name(name))
            || states.iter().any(|s| s.is_pc && s.has_name(name))
    };

    let mut resolved: Vec<String> = Vec::new();
    for name in requested {
        if resolved.len() >= max_responders {
            break;
        }
        if is_player(name) {
            continue;
        }
        let canonical = scenario
            .cards_of(StoryCardType::Character)
            .find(|card| card.has_name(name))
            .map(|card| card.name.clone())
            .or_else(|| {
                states
                    .iter()
                    .find(|s| !s.is_pc && s.has_name(name))
                    .map(|s| s.character_name.clone())
            });
        match canonical {
            Some(canonical) if !resolved.contains(&canonical) => resolved.push(canonical),
            Some(_) => {}
            None => debug!(name = %name, "ignoring unknown responder"),
        }
    }
    resolved
}
