//! Row types and their conversion into domain models.

use chrono::{DateTime, Utc};
use lore_core::error::DomainError;
use lore_core::model::{
    Adventure, CharacterAction, Plot, Scenario, Scene, SceneUpdate, StoryCard, StoryEvent,
};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// Maps a driver error onto the domain's infrastructure error.
pub(crate) fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Debug, FromRow)]
pub(crate) struct ScenarioRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub status: String,
    pub plot: Json<Plot>,
    pub source_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScenarioRow {
    pub(crate) fn into_scenario(self, story_cards: Vec<StoryCard>) -> Result<Scenario, DomainError> {
        Ok(Scenario {
            id: self.id,
            title: self.title,
            description: self.description,
            tags: self.tags,
            status: self.status.parse()?,
            plot: self.plot.0,
            story_cards,
            source_hash: self.source_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct StoryCardRow {
    pub id: Uuid,
    pub scenario_id: Uuid,
    pub card_type: String,
    pub name: String,
    pub entry: String,
    pub triggers: Vec<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<StoryCardRow> for StoryCard {
    type Error = DomainError;

    fn try_from(row: StoryCardRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            scenario_id: row.scenario_id,
            card_type: row.card_type.parse()?,
            name: row.name,
            entry: row.entry,
            triggers: row.triggers,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AdventureRow {
    pub id: Uuid,
    pub scenario_id: Uuid,
    pub title: String,
    pub current_story_summary: String,
    pub memory: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AdventureRow> for Adventure {
    fn from(row: AdventureRow) -> Self {
        Self {
            id: row.id,
            scenario_id: row.scenario_id,
            title: row.title,
            current_story_summary: row.current_story_summary,
            memory: row.memory,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct EventRow {
    pub id: Uuid,
    pub adventure_id: Uuid,
    pub sequence_number: i64,
    pub action_type: String,
    pub actor_name: String,
    pub player_input: String,
    pub narration: String,
    pub character_actions: Json<Vec<CharacterAction>>,
    pub scene_update: Option<Json<SceneUpdate>>,
    pub scene_snapshot: Json<Scene>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for StoryEvent {
    type Error = DomainError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            adventure_id: row.adventure_id,
            sequence_number: row.sequence_number,
            action_type: row.action_type.parse()?,
            actor_name: row.actor_name,
            player_input: row.player_input,
            narration: row.narration,
            character_actions: row.character_actions.0,
            scene_update: row.scene_update.map(|json| json.0),
            scene_snapshot: row.scene_snapshot.0,
            created_at: row.created_at,
        })
    }
}
