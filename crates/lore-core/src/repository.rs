//! Repository abstractions over the relational store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::model::{
    Adventure, CharacterState, Scenario, ScenarioStatus, Scene, StoryCard, StoryEvent,
};

/// Everything a single turn writes, persisted atomically.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    /// The new history entry. Its `sequence_number` must be the next free one.
    pub event: StoryEvent,
    /// The scene after the turn.
    pub scene: Scene,
    /// Character states created or changed by the turn (upserted by name).
    pub character_states: Vec<CharacterState>,
    /// Time the turn was recorded; becomes the adventure's `updated_at`.
    pub recorded_at: DateTime<Utc>,
}

/// CRUD access to scenarios and their story cards.
#[async_trait]
pub trait ScenarioRepository: Send + Sync {
    /// Inserts a scenario together with its story cards.
    async fn insert_scenario(&self, scenario: &Scenario) -> Result<(), DomainError>;

    /// Loads a scenario with its cards in creation order.
    async fn get_scenario(&self, id: Uuid) -> Result<Option<Scenario>, DomainError>;

    /// Finds a scenario previously imported from a document with this hash.
    async fn find_scenario_by_source_hash(
        &self,
        source_hash: &str,
    ) -> Result<Option<Scenario>, DomainError>;

    /// Lists scenarios (without cards), most recently updated first.
    async fn list_scenarios(
        &self,
        status: Option<ScenarioStatus>,
    ) -> Result<Vec<Scenario>, DomainError>;

    /// Overwrites a scenario's own fields. Cards are left untouched.
    async fn update_scenario(&self, scenario: &Scenario) -> Result<(), DomainError>;

    /// Deletes a scenario, its cards and its adventures. Returns whether a
    /// row existed.
    async fn delete_scenario(&self, id: Uuid) -> Result<bool, DomainError>;

    /// Inserts a story card.
    async fn insert_card(&self, card: &StoryCard) -> Result<(), DomainError>;

    /// Loads a story card.
    async fn get_card(&self, id: Uuid) -> Result<Option<StoryCard>, DomainError>;

    /// Overwrites a story card.
    async fn update_card(&self, card: &StoryCard) -> Result<(), DomainError>;

    /// Deletes a story card. Returns whether a row existed.
    async fn delete_card(&self, id: Uuid) -> Result<bool, DomainError>;
}

/// Access to adventures, their scene, character states and history.
#[async_trait]
pub trait AdventureRepository: Send + Sync {
    /// Inserts a new adventure with its starting scene and character states.
    async fn insert_adventure(
        &self,
        adventure: &Adventure,
        scene: &Scene,
        character_states: &[CharacterState],
    ) -> Result<(), DomainError>;

    /// Loads an adventure.
    async fn get_adventure(&self, id: Uuid) -> Result<Option<Adventure>, DomainError>;

    /// Lists adventures, most recently updated first.
    async fn list_adventures(
        &self,
        scenario_id: Option<Uuid>,
    ) -> Result<Vec<Adventure>, DomainError>;

    /// Overwrites an adventure's title, summary, memory and `updated_at`.
    async fn update_adventure(&self, adventure: &Adventure) -> Result<(), DomainError>;

    /// Deletes an adventure and everything it owns. Returns whether a row
    /// existed.
    async fn delete_adventure(&self, id: Uuid) -> Result<bool, DomainError>;

    /// Current scene; an empty scene if none was stored.
    async fn get_scene(&self, adventure_id: Uuid) -> Result<Scene, DomainError>;

    /// Character states ordered by name.
    async fn list_character_states(
        &self,
        adventure_id: Uuid,
    ) -> Result<Vec<CharacterState>, DomainError>;

    /// Full history in ascending sequence order.
    async fn list_events(&self, adventure_id: Uuid) -> Result<Vec<StoryEvent>, DomainError>;

    /// The last `limit` events, in chronological order.
    async fn recent_events(
        &self,
        adventure_id: Uuid,
        limit: usize,
    ) -> Result<Vec<StoryEvent>, DomainError>;

    /// Persists a turn atomically.
    ///
    /// Fails with `DomainError::ConcurrencyConflict` if the event's sequence
    /// number is already taken.
    async fn record_turn(&self, turn: &TurnRecord) -> Result<(), DomainError>;

    /// Removes the latest event and restores the scene to the snapshot of the
    /// event before it, or to `fallback_scene` when no event remains.
    /// Returns the removed event, or `None` if the history was empty.
    async fn undo_last_event(
        &self,
        adventure_id: Uuid,
        fallback_scene: &Scene,
        at: DateTime<Utc>,
    ) -> Result<Option<StoryEvent>, DomainError>;
}
