//! Command handlers for turn orchestration and the other story-model tasks.
//!
//! Handlers load what they need through the repository traits, talk to the
//! models through `LlmClient` and persist through `record_turn`, so every
//! turn is written atomically or not at all.

use std::fmt::Write as _;

use lore_core::clock::Clock;
use lore_core::command::Command;
use lore_core::error::DomainError;
use lore_core::model::{ActionType, Adventure, Scenario, StoryCard, StoryCardType};
use lore_core::repository::{AdventureRepository, ScenarioRepository};
use lore_llm::{CompletionRequest, LlmClient};
use lore_scenario::application::command_handlers::handle_create_story_card;
use lore_scenario::domain::commands::{CardDraft, CreateStoryCard};
use lore_scenario::domain::triggers::triggered_cards;
use serde::Serialize;
use tracing::{info, instrument};

pub use super::turn::TurnOutcome;
use super::turn::{TurnPlan, play_turn};
use crate::domain::commands::{Chat, GenerateNpc, StartAdventure, SummarizeAdventure, TakeTurn};
use crate::domain::context::{
    ContextLimits, TurnContextInput, build_opening_context, build_turn_context,
};
use crate::domain::lenient::truncate_chars;
use crate::domain::npc::{NpcDraft, build_npc_prompt, parse_npc};
use crate::domain::prompts::PromptSet;

/// Player input recorded for an adventure's opening event.
pub const OPENING_INPUT: &str = "[Adventure begins]";

const SUMMARY_EVENT_WINDOW: usize = 10;
const SUMMARY_EVENTS_SHOWN: usize = 5;
const SUMMARY_RESPONSE_CHARS: usize = 150;
const EMPTY_SUMMARY: &str = "The adventure has just begun.";

/// Tunables for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSettings {
    /// Bounds on the director's context.
    pub context: ContextLimits,
    /// Most characters voiced per turn.
    pub max_responders: usize,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            context: ContextLimits::default(),
            max_responders: 3,
        }
    }
}

/// Result of an NPC generation request.
#[derive(Debug, Clone, Serialize)]
pub struct NpcResult {
    /// The model's reply, verbatim.
    pub raw_response: String,
    /// The parsed draft, if the reply named a character.
    pub npc: Option<NpcDraft>,
    /// The stored card, when saving was requested and a draft was parsed.
    pub card: Option<StoryCard>,
}

async fn load_adventure(
    adventure_id: uuid::Uuid,
    adventures: &dyn AdventureRepository,
) -> Result<Adventure, DomainError> {
    adventures
        .get_adventure(adventure_id)
        .await?
        .ok_or_else(|| DomainError::not_found("adventure", adventure_id))
}

async fn load_scenario(
    scenario_id: uuid::Uuid,
    scenarios: &dyn ScenarioRepository,
) -> Result<Scenario, DomainError> {
    scenarios
        .get_scenario(scenario_id)
        .await?
        .ok_or_else(|| DomainError::not_found("scenario", scenario_id))
}

/// Handles the `StartAdventure` command: the story director sets the opening
/// scene, recorded as event 1.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the adventure or its scenario does not
/// exist, `DomainError::Validation` if the adventure already has history,
/// `DomainError::Upstream` if a model call fails, or a repository error.
#[instrument(skip_all, fields(
    command_type = command.command_type(),
    correlation_id = %command.correlation_id,
    adventure_id = %command.adventure_id,
))]
pub async fn handle_start_adventure(
    command: &StartAdventure,
    clock: &dyn Clock,
    scenarios: &dyn ScenarioRepository,
    adventures: &dyn AdventureRepository,
    llm: &dyn LlmClient,
    prompts: &PromptSet,
    settings: &TurnSettings,
) -> Result<TurnOutcome, DomainError> {
    let adventure = load_adventure(command.adventure_id, adventures).await?;
    if !adventures.recent_events(adventure.id, 1).await?.is_empty() {
        return Err(DomainError::Validation(
            "adventure has already started".to_owned(),
        ));
    }
    let scenario = load_scenario(adventure.scenario_id, scenarios).await?;
    let scene = adventures.get_scene(adventure.id).await?;
    let states = adventures.list_character_states(adventure.id).await?;

    let director_message = format!(
        "{}\n\n## Your Task\nGenerate an engaging opening scene for this adventure. \
         Set the stage, hook the player, and present options for action.",
        build_opening_context(&scenario)
    );
    let outcome = play_turn(
        TurnPlan {
            scenario: &scenario,
            adventure: &adventure,
            scene,
            states,
            action_type: ActionType::Story,
            player_input: OPENING_INPUT.to_owned(),
            player_action: OPENING_INPUT.to_owned(),
            actor: None,
            sequence_number: 1,
            director_message,
        },
        settings.max_responders,
        clock,
        adventures,
        llm,
        prompts,
    )
    .await?;

    info!(
        responders = outcome.event.character_actions.len(),
        "adventure started"
    );
    Ok(outcome)
}

/// Handles the `TakeTurn` command: one full pass of the turn pipeline.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the input is blank,
/// `DomainError::NotFound` if the adventure or its scenario does not exist,
/// `DomainError::Upstream` if a model call fails,
/// `DomainError::ConcurrencyConflict` if another turn was recorded first, or
/// a repository error.
#[instrument(skip_all, fields(
    command_type = command.command_type(),
    correlation_id = %command.correlation_id,
    adventure_id = %command.adventure_id,
    action_type = %command.action_type,
))]
pub async fn handle_take_turn(
    command: &TakeTurn,
    clock: &dyn Clock,
    scenarios: &dyn ScenarioRepository,
    adventures: &dyn AdventureRepository,
    llm: &dyn LlmClient,
    prompts: &PromptSet,
    settings: &TurnSettings,
) -> Result<TurnOutcome, DomainError> {
    if command.input.trim().is_empty() {
        return Err(DomainError::Validation("input must not be blank".to_owned()));
    }
    let adventure = load_adventure(command.adventure_id, adventures).await?;
    let scenario = load_scenario(adventure.scenario_id, scenarios).await?;
    let scene = adventures.get_scene(adventure.id).await?;
    let states = adventures.list_character_states(adventure.id).await?;
    let recent = adventures
        .recent_events(adventure.id, settings.context.recent_event_limit.max(1))
        .await?;
    let sequence_number = recent.last().map_or(1, |e| e.sequence_number + 1);

    let pc_name = scenario.player_character_name().map(str::to_owned);
    let narrated_actor = pc_name.as_deref().filter(|_| scenario.plot.third_person);
    let player_action = command
        .action_type
        .format_input(&command.input, narrated_actor);

    let triggered = triggered_cards(
        &scenario.story_cards,
        &command.input,
        &scene.characters_present,
    );
    let context = build_turn_context(
        &TurnContextInput {
            scenario: &scenario,
            adventure: &adventure,
            scene: &scene,
            character_states: &states,
            triggered_cards: &triggered,
            recent_events: &recent,
        },
        &settings.context,
    );
    let director_message = format!(
        "{context}\n\n## Current Action\n{player_action}\n\n## Your Task\n\
         Continue the story based on this action."
    );

    let outcome = play_turn(
        TurnPlan {
            scenario: &scenario,
            adventure: &adventure,
            scene,
            states,
            action_type: command.action_type,
            player_input: command.input.trim().to_owned(),
            player_action,
            actor: pc_name,
            sequence_number,
            director_message,
        },
        settings.max_responders,
        clock,
        adventures,
        llm,
        prompts,
    )
    .await?;

    info!(
        sequence_number,
        triggered = triggered.len(),
        responders = outcome
            .event
            .character_actions
            .iter()
            .filter(|a| !a.is_pc)
            .count(),
        "turn recorded"
    );
    Ok(outcome)
}

/// Handles the `SummarizeAdventure` command: folds the latest events into
/// the adventure's running summary.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the adventure does not exist,
/// `DomainError::Upstream` if the model call fails, or a repository error.
#[instrument(skip_all, fields(
    command_type = command.command_type(),
    correlation_id = %command.correlation_id,
    adventure_id = %command.adventure_id,
))]
pub async fn handle_summarize(
    command: &SummarizeAdventure,
    clock: &dyn Clock,
    adventures: &dyn AdventureRepository,
    llm: &dyn LlmClient,
    prompts: &PromptSet,
) -> Result<String, DomainError> {
    let mut adventure = load_adventure(command.adventure_id, adventures).await?;
    let recent = adventures
        .recent_events(adventure.id, SUMMARY_EVENT_WINDOW)
        .await?;
    if recent.is_empty() {
        return Ok(adventure.current_story_summary);
    }

    let mut events = String::new();
    let shown = &recent[recent.len().saturating_sub(SUMMARY_EVENTS_SHOWN)..];
    for event in shown {
        let _ = writeln!(
            events,
            "- Player ({}): {}\n  Result: {}",
            event.action_type,
            event.player_input,
            truncate_chars(&event.ai_response(), SUMMARY_RESPONSE_CHARS)
        );
    }
    let current = match adventure.current_story_summary.trim() {
        "" => EMPTY_SUMMARY,
        summary => summary,
    };
    let message = format!(
        "## Current Summary\n{current}\n\n## New Events\n{}\n\n## Your Task\n\
         Update the story summary to incorporate these new events. Keep it under \
         300 words and focus on key plot points, character developments, and \
         unresolved threads.",
        events.trim_end()
    );

    let summary = llm
        .complete(&CompletionRequest::story(prompts.summarizer.as_str(), message))
        .await?;
    summary.trim().clone_into(&mut adventure.current_story_summary);
    adventure.updated_at = clock.now();
    adventures.update_adventure(&adventure).await?;

    info!(events = shown.len(), "summary updated");
    Ok(adventure.current_story_summary)
}

fn card_draft_from(npc: &NpcDraft) -> CardDraft {
    let triggers = if npc.triggers.iter().any(|t| !t.trim().is_empty()) {
        npc.triggers.clone()
    } else {
        vec![npc.name.clone()]
    };
    let mut notes = npc.notes.trim().to_owned();
    if !npc.personality_traits.is_empty() {
        if !notes.is_empty() {
            notes.push('\n');
        }
        let _ = write!(notes, "Personality: {}", npc.personality_traits.join(", "));
    }
    CardDraft {
        name: npc.name.clone(),
        card_type: StoryCardType::Character,
        entry: npc.entry.trim().to_owned(),
        triggers,
        notes,
    }
}

/// Handles the `GenerateNpc` command: asks the story model for a new
/// character and optionally stores it as a `character` card.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the request is blank,
/// `DomainError::NotFound` if the scenario does not exist,
/// `DomainError::Upstream` if the model call fails, or a repository error.
#[instrument(skip_all, fields(
    command_type = command.command_type(),
    correlation_id = %command.correlation_id,
    scenario_id = %command.scenario_id,
))]
pub async fn handle_generate_npc(
    command: &GenerateNpc,
    clock: &dyn Clock,
    scenarios: &dyn ScenarioRepository,
    llm: &dyn LlmClient,
    prompts: &PromptSet,
) -> Result<NpcResult, DomainError> {
    if command.request.trim().is_empty() {
        return Err(DomainError::Validation(
            "request must not be blank".to_owned(),
        ));
    }
    let scenario = load_scenario(command.scenario_id, scenarios).await?;
    let raw_response = llm
        .complete(&CompletionRequest::story(
            prompts.npc_creation.as_str(),
            build_npc_prompt(&scenario, &command.request),
        ))
        .await?;
    let npc = parse_npc(&raw_response);

    let card = match (&npc, command.save) {
        (Some(draft), true) => Some(
            handle_create_story_card(
                &CreateStoryCard {
                    correlation_id: command.correlation_id,
                    scenario_id: scenario.id,
                    card: card_draft_from(draft),
                },
                clock,
                scenarios,
            )
            .await?,
        ),
        _ => None,
    };

    info!(
        parsed = npc.is_some(),
        saved = card.is_some(),
        "npc generated"
    );
    Ok(NpcResult {
        raw_response,
        npc,
        card,
    })
}

/// Handles the `Chat` command: one free-form story-model completion.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the message is blank, or
/// `DomainError::Upstream` if the model call fails.
#[instrument(skip_all, fields(
    command_type = command.command_type(),
    correlation_id = %command.correlation_id,
))]
pub async fn handle_chat(
    command: &Chat,
    llm: &dyn LlmClient,
    prompts: &PromptSet,
) -> Result<String, DomainError> {
    if command.message.trim().is_empty() {
        return Err(DomainError::Validation(
            "message must not be blank".to_owned(),
        ));
    }
    let system = command
        .system_prompt
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(&prompts.chat);
    let reply = llm
        .complete(&CompletionRequest::story(system, command.message.trim()))
        .await?;
    Ok(reply)
}
