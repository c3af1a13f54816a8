//! The current scene of an adventure and the deltas that move it along.

use serde::{Deserialize, Serialize};

use super::name::same_name;

/// Where the story currently is and who is there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Name of the current location.
    pub location_name: String,
    /// Prose description of the location.
    pub location_description: String,
    /// Names of the characters in the scene.
    pub characters_present: Vec<String>,
    /// What is happening right now.
    pub situation: String,
    /// Atmosphere.
    pub mood: String,
    /// Morning, dusk, ...
    pub time_of_day: String,
    /// Weather, when relevant.
    pub weather: String,
    /// Anything else worth keeping in context.
    pub notes: String,
}

/// Partial scene change proposed by the story model.
///
/// Every field is optional. Text fields overwrite when present and non-blank.
/// `characters_present` replaces the roster before `characters_entering` and
/// `characters_leaving` are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneUpdate {
    /// New location name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    /// New location description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_description: Option<String>,
    /// Full replacement roster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters_present: Option<Vec<String>>,
    /// Characters joining the scene.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub characters_entering: Vec<String>,
    /// Characters leaving the scene.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub characters_leaving: Vec<String>,
    /// New situation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub situation: Option<String>,
    /// New mood.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// New time of day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
    /// New weather.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    /// New notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SceneUpdate {
    /// Returns `true` when applying this update cannot change a scene.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        blank(&self.location_name)
            && blank(&self.location_description)
            && blank(&self.situation)
            && blank(&self.mood)
            && blank(&self.time_of_day)
            && blank(&self.weather)
            && blank(&self.notes)
            && self.characters_present.is_none()
            && self.characters_entering.is_empty()
            && self.characters_leaving.is_empty()
    }
}

fn overwrite(target: &mut String, value: Option<&String>) {
    if let Some(value) = value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
        value.clone_into(target);
    }
}

fn contains_name(names: &[String], name: &str) -> bool {
    names.iter().any(|n| same_name(n, name))
}

impl Scene {
    /// Starting scene for a fresh adventure: just the given characters.
    #[must_use]
    pub fn with_characters(names: impl IntoIterator<Item = String>) -> Self {
        let mut scene = Self::default();
        for name in names {
            scene.add_character(&name);
        }
        scene
    }

    /// Adds a character unless someone with that name is already present.
    pub fn add_character(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() && !contains_name(&self.characters_present, name) {
            self.characters_present.push(name.to_owned());
        }
    }

    /// Returns `true` if the named character is present, ignoring case.
    #[must_use]
    pub fn is_present(&self, name: &str) -> bool {
        contains_name(&self.characters_present, name.trim())
    }

    /// Merges a scene delta into this scene.
    pub fn apply(&mut self, update: &SceneUpdate) {
        overwrite(&mut self.location_name, update.location_name.as_ref());
        overwrite(
            &mut self.location_description,
            update.location_description.as_ref(),
        );
        overwrite(&mut self.situation, update.situation.as_ref());
        overwrite(&mut self.mood, update.mood.as_ref());
        overwrite(&mut self.time_of_day, update.time_of_day.as_ref());
        overwrite(&mut self.weather, update.weather.as_ref());
        overwrite(&mut self.notes, update.notes.as_ref());

        if let Some(roster) = &update.characters_present {
            self.characters_present.clear();
            for name in roster {
                self.add_character(name);
            }
        }
        for name in &update.characters_entering {
            self.add_character(name);
        }
        for name in &update.characters_leaving {
            let name = name.trim();
            self.characters_present
                .retain(|present| !same_name(present, name));
        }
    }

    /// Multi-line description used in model prompts. Empty fields are skipped.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.location_name.is_empty() {
            parts.push(format!("Location: {}", self.location_name));
        }
        if !self.location_description.is_empty() {
            parts.push(self.location_description.clone());
        }
        if !self.time_of_day.is_empty() {
            parts.push(format!("Time: {}", self.time_of_day));
        }
        if !self.weather.is_empty() {
            parts.push(format!("Weather: {}", self.weather));
        }
        if !self.mood.is_empty() {
            parts.push(format!("Mood: {}", self.mood));
        }
        if !self.characters_present.is_empty() {
            parts.push(format!("Present: {}", self.characters_present.join(", ")));
        }
        if !self.situation.is_empty() {
            parts.push(format!("Situation: {}", self.situation));
        }
        parts.join("\n")
    }
}
