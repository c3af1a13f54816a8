//! Drafting new non-player characters with the story model.

use lore_core::model::{Scenario, StoryCardType};
use serde::{Deserialize, Serialize};

use super::lenient::parse_lenient;

/// A character proposed by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcDraft {
    pub name: String,
    #[serde(alias = "description")]
    pub entry: String,
    #[serde(alias = "keywords")]
    pub triggers: Vec<String>,
    pub notes: String,
    #[serde(alias = "traits")]
    pub personality_traits: Vec<String>,
}

/// Builds the user message for an NPC request.
#[must_use]
pub fn build_npc_prompt(scenario: &Scenario, request: &str) -> String {
    let existing: Vec<&str> = scenario
        .cards_of(StoryCardType::Character)
        .map(|c| c.name.as_str())
        .collect();
    let existing = if existing.is_empty() {
        "None yet".to_owned()
    } else {
        existing.join(", ")
    };

    let mut parts = Vec::new();
    if !scenario.description.trim().is_empty() {
        parts.push(format!("## Setting\n{}", scenario.description.trim()));
    }
    if !scenario.plot.story_summary.trim().is_empty() {
        parts.push(format!(
            "## Story Context\n{}",
            scenario.plot.story_summary.trim()
        ));
    }
    parts.push(format!("## Existing Characters\n{existing}"));
    parts.push(format!("## Creation Request\n{}", request.trim()));
    parts.push(
        "## Your Task\nCreate a new character that fits this world and context.".to_owned(),
    );
    parts.join("\n\n")
}

/// Parses the model's draft; `None` if it carries no named character.
#[must_use]
pub fn parse_npc(raw: &str) -> Option<NpcDraft> {
    parse_lenient::<NpcDraft>(raw)
        .map(|mut draft| {
            draft.name = draft.name.trim().to_owned();
            draft
        })
        .filter(|draft| !draft.name.is_empty())
}
