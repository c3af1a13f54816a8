//! Commands for the adventure lifecycle.

use lore_core::command::Command;
use uuid::Uuid;

/// Command to start a new adventure from a scenario.
#[derive(Debug, Clone)]
pub struct CreateAdventure {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The scenario to play.
    pub scenario_id: Uuid,
    /// Title; defaults to `Adventure in <scenario title>` when absent or blank.
    pub title: Option<String>,
}

impl Command for CreateAdventure {
    fn command_type(&self) -> &'static str {
        "adventure.create_adventure"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to edit an adventure's title, running summary or memory.
#[derive(Debug, Clone, Default)]
pub struct UpdateAdventure {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The adventure to change.
    pub adventure_id: Uuid,
    pub title: Option<String>,
    pub current_story_summary: Option<String>,
    pub memory: Option<String>,
}

impl Command for UpdateAdventure {
    fn command_type(&self) -> &'static str {
        "adventure.update_adventure"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to delete an adventure and its history.
#[derive(Debug, Clone)]
pub struct DeleteAdventure {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The adventure to delete.
    pub adventure_id: Uuid,
}

impl Command for DeleteAdventure {
    fn command_type(&self) -> &'static str {
        "adventure.delete_adventure"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to remove the latest turn of an adventure.
#[derive(Debug, Clone)]
pub struct UndoLastTurn {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The adventure to rewind.
    pub adventure_id: Uuid,
}

impl Command for UndoLastTurn {
    fn command_type(&self) -> &'static str {
        "adventure.undo_last_turn"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
