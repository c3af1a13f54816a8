//! `PostgreSQL` implementation of the `AdventureRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lore_core::error::DomainError;
use lore_core::model::{Adventure, CharacterState, Scene, StoryEvent};
use lore_core::repository::{AdventureRepository, TurnRecord};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::rows::{AdventureRow, EventRow, infrastructure, is_unique_violation};

const SELECT_EVENTS: &str = "SELECT id, adventure_id, sequence_number, action_type, actor_name, \
     player_input, narration, character_actions, scene_update, scene_snapshot, created_at \
     FROM adventure_events";

/// PostgreSQL-backed adventure repository.
#[derive(Debug, Clone)]
pub struct PgAdventureRepository {
    pool: PgPool,
}

impl PgAdventureRepository {
    /// Creates a new `PgAdventureRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn upsert_scene(
    conn: &mut PgConnection,
    adventure_id: Uuid,
    scene: &Scene,
) -> Result<(), DomainError> {
    sqlx::query(
        "INSERT INTO scenes (adventure_id, scene) VALUES ($1, $2) \
         ON CONFLICT (adventure_id) DO UPDATE SET scene = EXCLUDED.scene",
    )
    .bind(adventure_id)
    .bind(Json(scene))
    .execute(conn)
    .await
    .map_err(infrastructure)?;
    Ok(())
}

async fn upsert_character_state(
    conn: &mut PgConnection,
    state: &CharacterState,
) -> Result<(), DomainError> {
    sqlx::query(
        "INSERT INTO character_states (id, adventure_id, character_name, state) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (adventure_id, (lower(character_name))) \
         DO UPDATE SET character_name = EXCLUDED.character_name, state = EXCLUDED.state",
    )
    .bind(state.id)
    .bind(state.adventure_id)
    .bind(&state.character_name)
    .bind(Json(state))
    .execute(conn)
    .await
    .map_err(infrastructure)?;
    Ok(())
}

async fn touch_adventure(
    conn: &mut PgConnection,
    adventure_id: Uuid,
    at: DateTime<Utc>,
) -> Result<(), DomainError> {
    sqlx::query("UPDATE adventures SET updated_at = $2 WHERE id = $1")
        .bind(adventure_id)
        .bind(at)
        .execute(conn)
        .await
        .map_err(infrastructure)?;
    Ok(())
}

fn into_events(rows: Vec<EventRow>) -> Result<Vec<StoryEvent>, DomainError> {
    rows.into_iter().map(StoryEvent::try_from).collect()
}

#[async_trait]
impl AdventureRepository for PgAdventureRepository {
    async fn insert_adventure(
        &self,
        adventure: &Adventure,
        scene: &Scene,
        character_states: &[CharacterState],
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infrastructure)?;
        sqlx::query(
            "INSERT INTO adventures \
             (id, scenario_id, title, current_story_summary, memory, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(adventure.id)
        .bind(adventure.scenario_id)
        .bind(&adventure.title)
        .bind(&adventure.current_story_summary)
        .bind(&adventure.memory)
        .bind(adventure.created_at)
        .bind(adventure.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(infrastructure)?;

        upsert_scene(&mut tx, adventure.id, scene).await?;
        for state in character_states {
            upsert_character_state(&mut tx, state).await?;
        }
        tx.commit().await.map_err(infrastructure)
    }

    async fn get_adventure(&self, id: Uuid) -> Result<Option<Adventure>, DomainError> {
        let row = sqlx::query_as::<_, AdventureRow>(
            "SELECT id, scenario_id, title, current_story_summary, memory, created_at, \
             updated_at FROM adventures WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(row.map(Adventure::from))
    }

    async fn list_adventures(
        &self,
        scenario_id: Option<Uuid>,
    ) -> Result<Vec<Adventure>, DomainError> {
        let rows = sqlx::query_as::<_, AdventureRow>(
            "SELECT id, scenario_id, title, current_story_summary, memory, created_at, \
             updated_at FROM adventures WHERE ($1::UUID IS NULL OR scenario_id = $1) \
             ORDER BY updated_at DESC",
        )
        .bind(scenario_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(rows.into_iter().map(Adventure::from).collect())
    }

    async fn update_adventure(&self, adventure: &Adventure) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE adventures SET title = $2, current_story_summary = $3, memory = $4, \
             updated_at = $5 WHERE id = $1",
        )
        .bind(adventure.id)
        .bind(&adventure.title)
        .bind(&adventure.current_story_summary)
        .bind(&adventure.memory)
        .bind(adventure.updated_at)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("adventure", adventure.id));
        }
        Ok(())
    }

    async fn delete_adventure(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM adventures WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_scene(&self, adventure_id: Uuid) -> Result<Scene, DomainError> {
        let scene: Option<Json<Scene>> =
            sqlx::query_scalar("SELECT scene FROM scenes WHERE adventure_id = $1")
                .bind(adventure_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(infrastructure)?;
        Ok(scene.map(|json| json.0).unwrap_or_default())
    }

    async fn list_character_states(
        &self,
        adventure_id: Uuid,
    ) -> Result<Vec<CharacterState>, DomainError> {
        let states: Vec<Json<CharacterState>> = sqlx::query_scalar(
            "SELECT state FROM character_states WHERE adventure_id = $1 \
             ORDER BY character_name",
        )
        .bind(adventure_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(states.into_iter().map(|json| json.0).collect())
    }

    async fn list_events(&self, adventure_id: Uuid) -> Result<Vec<StoryEvent>, DomainError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "{SELECT_EVENTS} WHERE adventure_id = $1 ORDER BY sequence_number"
        ))
        .bind(adventure_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;
        into_events(rows)
    }

    async fn recent_events(
        &self,
        adventure_id: Uuid,
        limit: usize,
    ) -> Result<Vec<StoryEvent>, DomainError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = sqlx::query_as::<_, EventRow>(&format!(
            "{SELECT_EVENTS} WHERE adventure_id = $1 ORDER BY sequence_number DESC LIMIT $2"
        ))
        .bind(adventure_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;
        rows.reverse();
        into_events(rows)
    }

    async fn record_turn(&self, turn: &TurnRecord) -> Result<(), DomainError> {
        let event = &turn.event;
        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        sqlx::query(
            "INSERT INTO adventure_events \
             (id, adventure_id, sequence_number, action_type, actor_name, player_input, \
              narration, character_actions, scene_update, scene_snapshot, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(event.id)
        .bind(event.adventure_id)
        .bind(event.sequence_number)
        .bind(event.action_type.as_str())
        .bind(&event.actor_name)
        .bind(&event.player_input)
        .bind(&event.narration)
        .bind(Json(&event.character_actions))
        .bind(event.scene_update.as_ref().map(Json))
        .bind(Json(&event.scene_snapshot))
        .bind(event.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                warn!(
                    adventure_id = %event.adventure_id,
                    sequence_number = event.sequence_number,
                    "sequence number already recorded"
                );
                DomainError::ConcurrencyConflict {
                    adventure_id: event.adventure_id,
                    sequence_number: event.sequence_number,
                }
            } else {
                infrastructure(err)
            }
        })?;

        upsert_scene(&mut tx, event.adventure_id, &turn.scene).await?;
        for state in &turn.character_states {
            upsert_character_state(&mut tx, state).await?;
        }
        touch_adventure(&mut tx, event.adventure_id, turn.recorded_at).await?;
        tx.commit().await.map_err(infrastructure)?;

        debug!(
            adventure_id = %event.adventure_id,
            sequence_number = event.sequence_number,
            states = turn.character_states.len(),
            "turn recorded"
        );
        Ok(())
    }

    async fn undo_last_event(
        &self,
        adventure_id: Uuid,
        fallback_scene: &Scene,
        at: DateTime<Utc>,
    ) -> Result<Option<StoryEvent>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        let removed = sqlx::query_as::<_, EventRow>(
            "DELETE FROM adventure_events WHERE id = (\
                 SELECT id FROM adventure_events WHERE adventure_id = $1 \
                 ORDER BY sequence_number DESC LIMIT 1 FOR UPDATE) \
             RETURNING id, adventure_id, sequence_number, action_type, actor_name, \
             player_input, narration, character_actions, scene_update, scene_snapshot, \
             created_at",
        )
        .bind(adventure_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(infrastructure)?;
        let Some(removed) = removed else {
            return Ok(None);
        };

        let previous: Option<Json<Scene>> = sqlx::query_scalar(
            "SELECT scene_snapshot FROM adventure_events WHERE adventure_id = $1 \
             ORDER BY sequence_number DESC LIMIT 1",
        )
        .bind(adventure_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(infrastructure)?;
        let restored = previous.map_or_else(|| fallback_scene.clone(), |json| json.0);

        upsert_scene(&mut tx, adventure_id, &restored).await?;
        touch_adventure(&mut tx, adventure_id, at).await?;
        tx.commit().await.map_err(infrastructure)?;

        StoryEvent::try_from(removed).map(Some)
    }
}
