//! Adventures: playthroughs of a scenario.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An instance of a scenario being played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adventure {
    /// Adventure identifier.
    pub id: Uuid,
    /// Scenario this adventure was started from.
    pub scenario_id: Uuid,
    /// Title.
    pub title: String,
    /// Running summary maintained by the summarizer.
    pub current_story_summary: String,
    /// Always-in-context memory, seeded from the plot essentials.
    pub memory: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last change, including new turns.
    pub updated_at: DateTime<Utc>,
}

impl Adventure {
    /// Default title for an adventure started from `scenario_title`.
    #[must_use]
    pub fn default_title(scenario_title: &str) -> String {
        format!("Adventure in {scenario_title}")
    }
}
