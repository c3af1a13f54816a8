//! Commands for turn orchestration and the other story-model tasks.

use lore_core::command::Command;
use lore_core::model::ActionType;
use uuid::Uuid;

/// Command to generate an adventure's opening scene.
#[derive(Debug, Clone)]
pub struct StartAdventure {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The adventure to open.
    pub adventure_id: Uuid,
}

impl Command for StartAdventure {
    fn command_type(&self) -> &'static str {
        "narrative.start_adventure"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to play one player turn.
#[derive(Debug, Clone)]
pub struct TakeTurn {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The adventure being played.
    pub adventure_id: Uuid,
    /// How the input is phrased into the story.
    pub action_type: ActionType,
    /// What the player typed.
    pub input: String,
}

impl Command for TakeTurn {
    fn command_type(&self) -> &'static str {
        "narrative.take_turn"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to refresh an adventure's running summary from recent events.
#[derive(Debug, Clone)]
pub struct SummarizeAdventure {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The adventure to summarize.
    pub adventure_id: Uuid,
}

impl Command for SummarizeAdventure {
    fn command_type(&self) -> &'static str {
        "narrative.summarize_adventure"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to draft a new non-player character for a scenario.
#[derive(Debug, Clone)]
pub struct GenerateNpc {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The scenario the character belongs to.
    pub scenario_id: Uuid,
    /// Free-form description of the character wanted.
    pub request: String,
    /// Whether to store the draft as a `character` story card.
    pub save: bool,
}

impl Command for GenerateNpc {
    fn command_type(&self) -> &'static str {
        "narrative.generate_npc"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to send one free-form message to the story model.
#[derive(Debug, Clone)]
pub struct Chat {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    pub message: String,
    /// System prompt replacing the default chat prompt.
    pub system_prompt: Option<String>,
}

impl Command for Chat {
    fn command_type(&self) -> &'static str {
        "narrative.chat"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
