//! Context assembly for the story director.
//!
//! The turn context is a Markdown document of `###` sections, in a fixed
//! order, bounded by a character budget. When over budget the oldest events
//! go first, then triggered cards from the end; fixed sections are never
//! cut.

use std::fmt::Write as _;

use lore_core::model::{Adventure, CharacterState, Scenario, Scene, StoryCard, StoryEvent};

use super::lenient::truncate_chars;

/// Characters of an event's story response kept in the context.
pub const EVENT_RESPONSE_CHARS: usize = 200;

/// Size limits for the turn context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    /// Most recent events considered.
    pub recent_event_limit: usize,
    /// Upper bound on the context length, in characters.
    pub max_context_chars: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            recent_event_limit: 5,
            max_context_chars: 8000,
        }
    }
}

/// Inputs to [`build_turn_context`].
#[derive(Debug, Clone, Copy)]
pub struct TurnContextInput<'a> {
    pub scenario: &'a Scenario,
    pub adventure: &'a Adventure,
    pub scene: &'a Scene,
    pub character_states: &'a [CharacterState],
    /// Cards triggered this turn, in card order.
    pub triggered_cards: &'a [&'a StoryCard],
    /// Recent events in chronological order.
    pub recent_events: &'a [StoryEvent],
}

fn section(out: &mut Vec<String>, title: &str, body: &str) {
    let body = body.trim();
    if !body.is_empty() {
        out.push(format!("### {title}\n{body}"));
    }
}

fn character_line(name: &str, states: &[CharacterState]) -> String {
    let Some(state) = states.iter().find(|s| s.has_name(name)) else {
        return format!("- **{name}** (NPC)");
    };
    let role = if state.is_pc { "PC" } else { "NPC" };
    let details: Vec<String> = [state.describe_personality(), state.describe_state()]
        .into_iter()
        .filter(|d| !d.is_empty())
        .collect();
    if details.is_empty() {
        format!("- **{name}** ({role})")
    } else {
        format!("- **{name}** ({role}): {}", details.join(" | "))
    }
}

fn card_line(card: &StoryCard) -> String {
    format!("**{}** ({}): {}", card.name, card.card_type, card.entry.trim())
}

fn event_lines(event: &StoryEvent) -> String {
    format!(
        "Player ({}): {}\nStory: {}",
        event.action_type,
        event.player_input,
        truncate_chars(&event.ai_response(), EVENT_RESPONSE_CHARS)
    )
}

fn fixed_sections(input: &TurnContextInput<'_>) -> (Vec<String>, Vec<String>) {
    let plot = &input.scenario.plot;
    let mut head = Vec::new();
    section(&mut head, "Plot Essentials", &plot.plot_essentials);
    section(
        &mut head,
        "Story Summary",
        &input.adventure.current_story_summary,
    );
    if input.adventure.memory.trim() != plot.plot_essentials.trim() {
        section(&mut head, "Memory", &input.adventure.memory);
    }
    section(&mut head, "Current Scene", &input.scene.describe());
    let characters: Vec<String> = input
        .scene
        .characters_present
        .iter()
        .map(|name| character_line(name, input.character_states))
        .collect();
    section(&mut head, "Characters", &characters.join("\n"));

    let mut tail = Vec::new();
    section(&mut tail, "Author's Note", &plot.authors_note);
    section(&mut tail, "AI Instructions", &plot.ai_instructions);
    (head, tail)
}

fn render(head: &[String], tail: &[String], cards: &[String], events: &[String]) -> String {
    let mut parts: Vec<String> = head.iter().chain(tail).cloned().collect();
    section(&mut parts, "Relevant Context", &cards.join("\n"));
    section(&mut parts, "Recent Events", &events.join("\n"));
    parts.join("\n\n")
}

/// Builds the story director's context for a regular turn.
#[must_use]
pub fn build_turn_context(input: &TurnContextInput<'_>, limits: &ContextLimits) -> String {
    let (head, tail) = fixed_sections(input);
    let mut cards: Vec<String> = input.triggered_cards.iter().map(|c| card_line(c)).collect();
    let skip = input
        .recent_events
        .len()
        .saturating_sub(limits.recent_event_limit);
    let mut events: Vec<String> = input.recent_events[skip..]
        .iter()
        .map(event_lines)
        .collect();

    loop {
        let context = render(&head, &tail, &cards, &events);
        if context.chars().count() <= limits.max_context_chars {
            return context;
        }
        if !events.is_empty() {
            events.remove(0);
        } else if cards.pop().is_none() {
            return context;
        }
    }
}

/// Builds the story director's context for an adventure's opening scene:
/// the scenario's premise and every story card.
#[must_use]
pub fn build_opening_context(scenario: &Scenario) -> String {
    let plot = &scenario.plot;
    let mut context = format!("## Scenario: {}", scenario.title);
    let mut parts = Vec::new();
    section(&mut parts, "Description", &scenario.description);
    section(&mut parts, "Initial Story", &plot.story);
    section(&mut parts, "Plot Essentials", &plot.plot_essentials);
    section(&mut parts, "AI Instructions", &plot.ai_instructions);
    section(&mut parts, "Author's Note", &plot.authors_note);
    let cards: Vec<String> = scenario
        .story_cards
        .iter()
        .map(|c| format!("- {}", card_line(c)))
        .collect();
    section(&mut parts, "Available Story Cards", &cards.join("\n"));
    for part in parts {
        let _ = write!(context, "\n\n{part}");
    }
    context
}
