//! In-character replies from the character model.

use std::fmt::Write as _;

use lore_core::model::{CharacterAction, CharacterState, Scene, StoryCard};
use serde::Deserialize;

use super::lenient::{parse_lenient, strip_code_fences};

/// Everything the character model sees about one responder.
#[derive(Debug, Clone, Copy)]
pub struct VoiceInput<'a> {
    pub character_name: &'a str,
    /// The character's story card, if it has one.
    pub card: Option<&'a StoryCard>,
    /// The character's state, if one exists yet.
    pub state: Option<&'a CharacterState>,
    pub scene: &'a Scene,
    /// This turn's narration from the story director.
    pub narration: &'a str,
    /// The player's action, already formatted.
    pub player_action: &'a str,
    /// Replies of characters who already spoke this turn.
    pub earlier_actions: &'a [CharacterAction],
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VoiceReply {
    action: String,
    speech: String,
    inner_thought: String,
}

/// Builds the user message for one character-voice call.
#[must_use]
pub fn build_voice_prompt(input: &VoiceInput<'_>) -> String {
    let mut prompt = format!("## Character: {}", input.character_name);

    if let Some(card) = input.card {
        if !card.entry.trim().is_empty() {
            let _ = write!(prompt, "\n\n### Description\n{}", card.entry.trim());
        }
        if !card.notes.trim().is_empty() {
            let _ = write!(prompt, "\n\n### Notes\n{}", card.notes.trim());
        }
    }
    if let Some(state) = input.state {
        let personality = state.describe_personality();
        if !personality.is_empty() {
            let _ = write!(prompt, "\n\n### Personality\n{personality}");
        }
        let current = state.describe_state();
        if !current.is_empty() {
            let _ = write!(prompt, "\n\n### Current State\n{current}");
        }
    }

    let scene = input.scene.describe();
    if !scene.is_empty() {
        let _ = write!(prompt, "\n\n### Scene\n{scene}");
    }
    if !input.narration.trim().is_empty() {
        let _ = write!(prompt, "\n\n### What Just Happened\n{}", input.narration.trim());
    }
    let _ = write!(prompt, "\n\n### Player says/does\n{}", input.player_action);

    let earlier: Vec<String> = input
        .earlier_actions
        .iter()
        .map(|a| (a, a.to_narrative()))
        .filter(|(_, narrative)| !narrative.is_empty())
        .map(|(a, narrative)| format!("- {}: {narrative}", a.character_name))
        .collect();
    if !earlier.is_empty() {
        let _ = write!(prompt, "\n\n### Others Have Responded\n{}", earlier.join("\n"));
    }

    prompt.push_str(
        "\n\n## Your Task\nRespond as this character would. Answer with a JSON object: \
         {\"action\": \"...\", \"speech\": \"...\", \"inner_thought\": \"...\"}",
    );
    prompt
}

fn unquote(text: &str) -> Option<&str> {
    ['"', '\u{201c}']
        .into_iter()
        .zip(['"', '\u{201d}'])
        .find_map(|(open, close)| text.strip_prefix(open)?.strip_suffix(close))
        .map(str::trim)
}

/// Parses a character-model reply into an action. Never fails.
///
/// Without a JSON object, a reply wrapped in double quotes becomes speech
/// and anything else becomes the action.
#[must_use]
pub fn parse_voice(raw: &str, character_name: &str) -> CharacterAction {
    let reply = parse_lenient::<VoiceReply>(raw)
        .filter(|r| !(r.action.trim().is_empty() && r.speech.trim().is_empty()))
        .unwrap_or_else(|| {
            let text = strip_code_fences(raw);
            match unquote(&text) {
                Some(speech) => VoiceReply {
                    speech: speech.to_owned(),
                    ..VoiceReply::default()
                },
                None => VoiceReply {
                    action: text,
                    ..VoiceReply::default()
                },
            }
        });

    CharacterAction {
        character_name: character_name.to_owned(),
        action: reply.action.trim().to_owned(),
        speech: reply.speech.trim().to_owned(),
        inner_thought: reply.inner_thought.trim().to_owned(),
        is_pc: false,
    }
}
