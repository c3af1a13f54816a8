//! Test repositories — in-memory and failing implementations of the
//! repository traits.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lore_core::error::DomainError;
use lore_core::model::{
    Adventure, CharacterState, Scenario, ScenarioStatus, Scene, StoryCard, StoryEvent,
};
use lore_core::repository::{AdventureRepository, ScenarioRepository, TurnRecord};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    scenarios: Vec<Scenario>,
    cards: Vec<StoryCard>,
    adventures: Vec<Adventure>,
    scenes: HashMap<Uuid, Scene>,
    character_states: Vec<CharacterState>,
    events: Vec<StoryEvent>,
}

impl Tables {
    fn drop_adventure(&mut self, id: Uuid) -> bool {
        let before = self.adventures.len();
        self.adventures.retain(|a| a.id != id);
        self.scenes.remove(&id);
        self.character_states.retain(|s| s.adventure_id != id);
        self.events.retain(|e| e.adventure_id != id);
        self.adventures.len() != before
    }

    fn touch_adventure(&mut self, id: Uuid, at: DateTime<Utc>) {
        if let Some(adventure) = self.adventures.iter_mut().find(|a| a.id == id) {
            adventure.updated_at = at;
        }
    }
}

/// A repository backed by plain collections behind a mutex. Implements both
/// repository traits with the same observable behavior as the PostgreSQL
/// store: cascading deletes, ordered listings and sequence-number conflicts.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a scenario (with its cards).
    #[must_use]
    pub fn with_scenario(self, scenario: Scenario) -> Self {
        {
            let mut tables = self.lock();
            tables.cards.extend(scenario.story_cards.iter().cloned());
            tables.scenarios.push(Scenario {
                story_cards: Vec::new(),
                ..scenario
            });
        }
        self
    }

    /// Seed an adventure with its scene and character states.
    #[must_use]
    pub fn with_adventure(
        self,
        adventure: Adventure,
        scene: Scene,
        character_states: Vec<CharacterState>,
    ) -> Self {
        {
            let mut tables = self.lock();
            tables.scenes.insert(adventure.id, scene);
            tables.character_states.extend(character_states);
            tables.adventures.push(adventure);
        }
        self
    }

    /// Seed a history event.
    #[must_use]
    pub fn with_event(self, event: StoryEvent) -> Self {
        self.lock().events.push(event);
        self
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }
}

#[async_trait]
impl ScenarioRepository for InMemoryStore {
    async fn insert_scenario(&self, scenario: &Scenario) -> Result<(), DomainError> {
        let mut tables = self.lock();
        let duplicate_hash = scenario.source_hash.is_some()
            && tables
                .scenarios
                .iter()
                .any(|s| s.source_hash == scenario.source_hash);
        if duplicate_hash {
            return Err(DomainError::Infrastructure(
                "duplicate key value violates unique constraint on source_hash".to_owned(),
            ));
        }
        tables.cards.extend(scenario.story_cards.iter().cloned());
        tables.scenarios.push(Scenario {
            story_cards: Vec::new(),
            ..scenario.clone()
        });
        Ok(())
    }

    async fn get_scenario(&self, id: Uuid) -> Result<Option<Scenario>, DomainError> {
        let tables = self.lock();
        Ok(tables.scenarios.iter().find(|s| s.id == id).map(|s| Scenario {
            story_cards: tables
                .cards
                .iter()
                .filter(|c| c.scenario_id == id)
                .cloned()
                .collect(),
            ..s.clone()
        }))
    }

    async fn find_scenario_by_source_hash(
        &self,
        source_hash: &str,
    ) -> Result<Option<Scenario>, DomainError> {
        let id = self
            .lock()
            .scenarios
            .iter()
            .find(|s| s.source_hash.as_deref() == Some(source_hash))
            .map(|s| s.id);
        match id {
            Some(id) => self.get_scenario(id).await,
            None => Ok(None),
        }
    }

    async fn list_scenarios(
        &self,
        status: Option<ScenarioStatus>,
    ) -> Result<Vec<Scenario>, DomainError> {
        let mut scenarios: Vec<Scenario> = self
            .lock()
            .scenarios
            .iter()
            .filter(|s| status.is_none_or(|wanted| s.status == wanted))
            .cloned()
            .collect();
        scenarios.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(scenarios)
    }

    async fn update_scenario(&self, scenario: &Scenario) -> Result<(), DomainError> {
        let mut tables = self.lock();
        let stored = tables
            .scenarios
            .iter_mut()
            .find(|s| s.id == scenario.id)
            .ok_or_else(|| DomainError::not_found("scenario", scenario.id))?;
        *stored = Scenario {
            story_cards: Vec::new(),
            ..scenario.clone()
        };
        Ok(())
    }

    async fn delete_scenario(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.lock();
        let before = tables.scenarios.len();
        tables.scenarios.retain(|s| s.id != id);
        tables.cards.retain(|c| c.scenario_id != id);
        let owned: Vec<Uuid> = tables
            .adventures
            .iter()
            .filter(|a| a.scenario_id == id)
            .map(|a| a.id)
            .collect();
        for adventure_id in owned {
            tables.drop_adventure(adventure_id);
        }
        Ok(tables.scenarios.len() != before)
    }

    async fn insert_card(&self, card: &StoryCard) -> Result<(), DomainError> {
        let mut tables = self.lock();
        if !tables.scenarios.iter().any(|s| s.id == card.scenario_id) {
            return Err(DomainError::Infrastructure(format!(
                "foreign key violation: scenario {}",
                card.scenario_id
            )));
        }
        tables.cards.push(card.clone());
        Ok(())
    }

    async fn get_card(&self, id: Uuid) -> Result<Option<StoryCard>, DomainError> {
        Ok(self.lock().cards.iter().find(|c| c.id == id).cloned())
    }

    async fn update_card(&self, card: &StoryCard) -> Result<(), DomainError> {
        let mut tables = self.lock();
        let stored = tables
            .cards
            .iter_mut()
            .find(|c| c.id == card.id)
            .ok_or_else(|| DomainError::not_found("story_card", card.id))?;
        *stored = card.clone();
        Ok(())
    }

    async fn delete_card(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.lock();
        let before = tables.cards.len();
        tables.cards.retain(|c| c.id != id);
        Ok(tables.cards.len() != before)
    }
}

#[async_trait]
impl AdventureRepository for InMemoryStore {
    async fn insert_adventure(
        &self,
        adventure: &Adventure,
        scene: &Scene,
        character_states: &[CharacterState],
    ) -> Result<(), DomainError> {
        let mut tables = self.lock();
        tables.adventures.push(adventure.clone());
        tables.scenes.insert(adventure.id, scene.clone());
        tables
            .character_states
            .extend(character_states.iter().cloned());
        Ok(())
    }

    async fn get_adventure(&self, id: Uuid) -> Result<Option<Adventure>, DomainError> {
        Ok(self.lock().adventures.iter().find(|a| a.id == id).cloned())
    }

    async fn list_adventures(
        &self,
        scenario_id: Option<Uuid>,
    ) -> Result<Vec<Adventure>, DomainError> {
        let mut adventures: Vec<Adventure> = self
            .lock()
            .adventures
            .iter()
            .filter(|a| scenario_id.is_none_or(|id| a.scenario_id == id))
            .cloned()
            .collect();
        adventures.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(adventures)
    }

    async fn update_adventure(&self, adventure: &Adventure) -> Result<(), DomainError> {
        let mut tables = self.lock();
        let stored = tables
            .adventures
            .iter_mut()
            .find(|a| a.id == adventure.id)
            .ok_or_else(|| DomainError::not_found("adventure", adventure.id))?;
        *stored = adventure.clone();
        Ok(())
    }

    async fn delete_adventure(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.lock().drop_adventure(id))
    }

    async fn get_scene(&self, adventure_id: Uuid) -> Result<Scene, DomainError> {
        Ok(self
            .lock()
            .scenes
            .get(&adventure_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_character_states(
        &self,
        adventure_id: Uuid,
    ) -> Result<Vec<CharacterState>, DomainError> {
        let mut states: Vec<CharacterState> = self
            .lock()
            .character_states
            .iter()
            .filter(|s| s.adventure_id == adventure_id)
            .cloned()
            .collect();
        states.sort_by(|a, b| a.character_name.cmp(&b.character_name));
        Ok(states)
    }

    async fn list_events(&self, adventure_id: Uuid) -> Result<Vec<StoryEvent>, DomainError> {
        let mut events: Vec<StoryEvent> = self
            .lock()
            .events
            .iter()
            .filter(|e| e.adventure_id == adventure_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.sequence_number);
        Ok(events)
    }

    async fn recent_events(
        &self,
        adventure_id: Uuid,
        limit: usize,
    ) -> Result<Vec<StoryEvent>, DomainError> {
        let events = self.list_events(adventure_id).await?;
        let skip = events.len().saturating_sub(limit);
        Ok(events.into_iter().skip(skip).collect())
    }

    async fn record_turn(&self, turn: &TurnRecord) -> Result<(), DomainError> {
        let mut tables = self.lock();
        let adventure_id = turn.event.adventure_id;
        let sequence_number = turn.event.sequence_number;
        if tables
            .events
            .iter()
            .any(|e| e.adventure_id == adventure_id && e.sequence_number == sequence_number)
        {
            return Err(DomainError::ConcurrencyConflict {
                adventure_id,
                sequence_number,
            });
        }

        tables.events.push(turn.event.clone());
        tables.scenes.insert(adventure_id, turn.scene.clone());
        for state in &turn.character_states {
            match tables.character_states.iter_mut().find(|s| {
                s.adventure_id == adventure_id && state.has_name(&s.character_name)
            }) {
                Some(stored) => *stored = state.clone(),
                None => tables.character_states.push(state.clone()),
            }
        }
        tables.touch_adventure(adventure_id, turn.recorded_at);
        Ok(())
    }

    async fn undo_last_event(
        &self,
        adventure_id: Uuid,
        fallback_scene: &Scene,
        at: DateTime<Utc>,
    ) -> Result<Option<StoryEvent>, DomainError> {
        let mut tables = self.lock();
        let Some(last_index) = tables
            .events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.adventure_id == adventure_id)
            .max_by_key(|(_, e)| e.sequence_number)
            .map(|(index, _)| index)
        else {
            return Ok(None);
        };

        let removed = tables.events.remove(last_index);
        let restored = tables
            .events
            .iter()
            .filter(|e| e.adventure_id == adventure_id)
            .max_by_key(|e| e.sequence_number)
            .map_or_else(|| fallback_scene.clone(), |e| e.scene_snapshot.clone());
        tables.scenes.insert(adventure_id, restored);
        tables.touch_adventure(adventure_id, at);
        Ok(Some(removed))
    }
}

/// A repository whose backing store is always unreachable. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingRepository;

fn unavailable<T>() -> Result<T, DomainError> {
    Err(DomainError::Infrastructure("connection refused".into()))
}

#[async_trait]
impl ScenarioRepository for FailingRepository {
    async fn insert_scenario(&self, _scenario: &Scenario) -> Result<(), DomainError> {
        unavailable()
    }

    async fn get_scenario(&self, _id: Uuid) -> Result<Option<Scenario>, DomainError> {
        unavailable()
    }

    async fn find_scenario_by_source_hash(
        &self,
        _source_hash: &str,
    ) -> Result<Option<Scenario>, DomainError> {
        unavailable()
    }

    async fn list_scenarios(
        &self,
        _status: Option<ScenarioStatus>,
    ) -> Result<Vec<Scenario>, DomainError> {
        unavailable()
    }

    async fn update_scenario(&self, _scenario: &Scenario) -> Result<(), DomainError> {
        unavailable()
    }

    async fn delete_scenario(&self, _id: Uuid) -> Result<bool, DomainError> {
        unavailable()
    }

    async fn insert_card(&self, _card: &StoryCard) -> Result<(), DomainError> {
        unavailable()
    }

    async fn get_card(&self, _id: Uuid) -> Result<Option<StoryCard>, DomainError> {
        unavailable()
    }

    async fn update_card(&self, _card: &StoryCard) -> Result<(), DomainError> {
        unavailable()
    }

    async fn delete_card(&self, _id: Uuid) -> Result<bool, DomainError> {
        unavailable()
    }
}

#[async_trait]
impl AdventureRepository for FailingRepository {
    async fn insert_adventure(
        &self,
        _adventure: &Adventure,
        _scene: &Scene,
        _character_states: &[CharacterState],
    ) -> Result<(), DomainError> {
        unavailable()
    }

    async fn get_adventure(&self, _id: Uuid) -> Result<Option<Adventure>, DomainError> {
        unavailable()
    }

    async fn list_adventures(
        &self,
        _scenario_id: Option<Uuid>,
    ) -> Result<Vec<Adventure>, DomainError> {
        unavailable()
    }

    async fn update_adventure(&self, _adventure: &Adventure) -> Result<(), DomainError> {
        unavailable()
    }

    async fn delete_adventure(&self, _id: Uuid) -> Result<bool, DomainError> {
        unavailable()
    }

    async fn get_scene(&self, _adventure_id: Uuid) -> Result<Scene, DomainError> {
        unavailable()
    }

    async fn list_character_states(
        &self,
        _adventure_id: Uuid,
    ) -> Result<Vec<CharacterState>, DomainError> {
        unavailable()
    }

    async fn list_events(&self, _adventure_id: Uuid) -> Result<Vec<StoryEvent>, DomainError> {
        unavailable()
    }

    async fn recent_events(
        &self,
        _adventure_id: Uuid,
        _limit: usize,
    ) -> Result<Vec<StoryEvent>, DomainError> {
        unavailable()
    }

    async fn record_turn(&self, _turn: &TurnRecord) -> Result<(), DomainError> {
        unavailable()
    }

    async fn undo_last_event(
        &self,
        _adventure_id: Uuid,
        _fallback_scene: &Scene,
        _at: DateTime<Utc>,
    ) -> Result<Option<StoryEvent>, DomainError> {
        unavailable()
    }
}
