//! The shared turn pipeline: director call, voices, merge, persist.

use lore_core::clock::Clock;
use lore_core::error::DomainError;
use lore_core::model::{
    ActionType, Adventure, CharacterAction, CharacterState, Scenario, Scene, StoryEvent,
};
use lore_core::repository::{AdventureRepository, TurnRecord};
use lore_llm::{CompletionRequest, LlmClient};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::decision::{parse_decision, resolve_responders};
use crate::domain::lenient::truncate_chars;
use crate::domain::prompts::PromptSet;
use crate::domain::voice::{VoiceInput, build_voice_prompt, parse_voice};

/// Characters of a character's latest narrative kept as its
/// `recent_actions_summary`.
const RECENT_ACTIONS_CHARS: usize = 200;

/// Actor recorded when no player character acted.
pub(crate) const NARRATOR: &str = "narrator";

/// What a played turn produced.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// The recorded history entry.
    pub event: StoryEvent,
    /// The scene after the turn.
    pub scene: Scene,
    /// All character states of the adventure after the turn.
    pub character_states: Vec<CharacterState>,
}

/// Inputs for one pass through the pipeline.
pub(crate) struct TurnPlan<'a> {
    pub scenario: &'a Scenario,
    pub adventure: &'a Adventure,
    pub scene: Scene,
    pub states: Vec<CharacterState>,
    pub action_type: ActionType,
    /// The input as recorded in history.
    pub player_input: String,
    /// The input as phrased into the story.
    pub player_action: String,
    /// Player character acting this turn, if the scenario has one.
    pub actor: Option<String>,
    pub sequence_number: i64,
    /// User message for the story director.
    pub director_message: String,
}

struct Merge<'a> {
    scenario: &'a Scenario,
    adventure_id: Uuid,
    states: Vec<CharacterState>,
    touched: Vec<bool>,
}

impl Merge<'_> {
    /// Index of the named character's state, seeding one from its card (or
    /// from nothing, when `allow_cardless`) on first appearance.
    fn state_for(&mut self, name: &str, allow_cardless: bool) -> Option<usize> {
        if let Some(index) = self.states.iter().position(|s| s.has_name(name)) {
            return Some(index);
        }
        let state = match self.scenario.character_card(name) {
            Some(card) => CharacterState::from_card(self.adventure_id, card),
            None if allow_cardless => CharacterState::new(self.adventure_id, name.trim(), false),
            None => return None,
        };
        debug!(character = %state.character_name, "seeding character state");
        self.states.push(state);
        self.touched.push(true);
        Some(self.states.len() - 1)
    }

    fn touch(&mut self, index: usize) -> &mut CharacterState {
        self.touched[index] = true;
        &mut self.states[index]
    }

    fn into_parts(self) -> (Vec<CharacterState>, Vec<CharacterState>) {
        let changed = self
            .states
            .iter()
            .zip(&self.touched)
            .filter(|(_, touched)| **touched)
            .map(|(state, _)| state.clone())
            .collect();
        (changed, self.states)
    }
}

fn player_character_action(
    action_type: ActionType,
    pc_name: &str,
    player_input: &str,
    player_action: &str,
) -> Option<CharacterAction> {
    let (action, speech) = match action_type {
        ActionType::Story => return None,
        ActionType::Say => (String::new(), player_input.trim().to_owned()),
        ActionType::Do | ActionType::DoSay => (player_action.to_owned(), String::new()),
    };
    Some(CharacterAction {
        character_name: pc_name.to_owned(),
        action,
        speech,
        inner_thought: String::new(),
        is_pc: true,
    })
}

/// Runs the director, voices the responders, merges the results and records
/// the turn.
pub(crate) async fn play_turn(
    plan: TurnPlan<'_>,
    max_responders: usize,
    clock: &dyn Clock,
    adventures: &dyn AdventureRepository,
    llm: &dyn LlmClient,
    prompts: &PromptSet,
) -> Result<TurnOutcome, DomainError> {
    let TurnPlan {
        scenario,
        adventure,
        mut scene,
        states,
        action_type,
        player_input,
        player_action,
        actor,
        sequence_number,
        director_message,
    } = plan;

    let raw = llm
        .complete(&CompletionRequest::story(
            prompts.story_director.as_str(),
            director_message,
        ))
        .await?;
    let decision = parse_decision(&raw);
    if let Some(update) = &decision.scene_update {
        scene.apply(update);
    }

    let touched = vec![false; states.len()];
    let mut merge = Merge {
        scenario,
        adventure_id: adventure.id,
        states,
        touched,
    };

    for (name, update) in &decision.character_updates {
        match merge.state_for(name, false) {
            Some(index) => merge.touch(index).apply(update),
            None => warn!(character = %name, "ignoring update for unknown character"),
        }
    }

    let responders = resolve_responders(
        &decision.responding_characters,
        scenario,
        &merge.states,
        max_responders,
    );
    debug!(
        adventure_id = %adventure.id,
        requested = decision.responding_characters.len(),
        resolved = responders.len(),
        "responders resolved"
    );

    let mut character_actions: Vec<CharacterAction> = Vec::new();
    if let Some(pc_name) = &actor {
        if let Some(action) =
            player_character_action(action_type, pc_name, &player_input, &player_action)
        {
            if let Some(index) = merge.state_for(pc_name, true) {
                merge.touch(index).recent_actions_summary =
                    truncate_chars(&action.to_narrative(), RECENT_ACTIONS_CHARS);
            }
            character_actions.push(action);
        }
    }

    let mut voiced: Vec<CharacterAction> = Vec::new();
    for name in &responders {
        scene.add_character(name);
        let index = merge.state_for(name, true);
        let message = build_voice_prompt(&VoiceInput {
            character_name: name,
            card: scenario.character_card(name),
            state: index.map(|i| &merge.states[i]),
            scene: &scene,
            narration: &decision.narration,
            player_action: &player_action,
            earlier_actions: &voiced,
        });
        let reply = llm
            .complete(&CompletionRequest::character(
                prompts.character_voice.as_str(),
                message,
            ))
            .await?;
        let action = parse_voice(&reply, name);
        if let Some(index) = index {
            merge.touch(index).recent_actions_summary =
                truncate_chars(&action.to_narrative(), RECENT_ACTIONS_CHARS);
        }
        voiced.push(action);
    }
    character_actions.extend(voiced);

    let now = clock.now();
    let event = StoryEvent {
        id: Uuid::new_v4(),
        adventure_id: adventure.id,
        sequence_number,
        action_type,
        actor_name: actor.unwrap_or_else(|| NARRATOR.to_owned()),
        player_input,
        narration: decision.narration,
        character_actions,
        scene_update: decision.scene_update,
        scene_snapshot: scene.clone(),
        created_at: now,
    };
    let (changed, mut all_states) = merge.into_parts();

    adventures
        .record_turn(&TurnRecord {
            event: event.clone(),
            scene: scene.clone(),
            character_states: changed,
            recorded_at: now,
        })
        .await?;

    all_states.sort_by(|a, b| a.character_name.cmp(&b.character_name));
    Ok(TurnOutcome {
        event,
        scene,
        character_states: all_states,
    })
}
