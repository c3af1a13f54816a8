//! `PostgreSQL` implementation of the `ScenarioRepository` trait.

use async_trait::async_trait;
use lore_core::error::DomainError;
use lore_core::model::{Scenario, ScenarioStatus, StoryCard};
use lore_core::repository::ScenarioRepository;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::rows::{ScenarioRow, StoryCardRow, infrastructure};

/// PostgreSQL-backed scenario repository.
#[derive(Debug, Clone)]
pub struct PgScenarioRepository {
    pool: PgPool,
}

impl PgScenarioRepository {
    /// Creates a new `PgScenarioRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn cards_for(&self, scenario_id: Uuid) -> Result<Vec<StoryCard>, DomainError> {
        sqlx::query_as::<_, StoryCardRow>(
            "SELECT id, scenario_id, card_type, name, entry, triggers, notes, created_at, \
             updated_at FROM story_cards WHERE scenario_id = $1 ORDER BY position",
        )
        .bind(scenario_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?
        .into_iter()
        .map(StoryCard::try_from)
        .collect()
    }

    async fn with_cards(&self, row: Option<ScenarioRow>) -> Result<Option<Scenario>, DomainError> {
        match row {
            Some(row) => {
                let cards = self.cards_for(row.id).await?;
                row.into_scenario(cards).map(Some)
            }
            None => Ok(None),
        }
    }
}

async fn insert_card_in(
    tx: &mut Transaction<'_, Postgres>,
    card: &StoryCard,
) -> Result<(), DomainError> {
    sqlx::query(
        "INSERT INTO story_cards \
         (id, scenario_id, card_type, name, entry, triggers, notes, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(card.id)
    .bind(card.scenario_id)
    .bind(card.card_type.as_str())
    .bind(&card.name)
    .bind(&card.entry)
    .bind(&card.triggers)
    .bind(&card.notes)
    .bind(card.created_at)
    .bind(card.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(infrastructure)?;
    Ok(())
}

#[async_trait]
impl ScenarioRepository for PgScenarioRepository {
    async fn insert_scenario(&self, scenario: &Scenario) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infrastructure)?;
        sqlx::query(
            "INSERT INTO scenarios \
             (id, title, description, tags, status, plot, source_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(scenario.id)
        .bind(&scenario.title)
        .bind(&scenario.description)
        .bind(&scenario.tags)
        .bind(scenario.status.as_str())
        .bind(Json(&scenario.plot))
        .bind(&scenario.source_hash)
        .bind(scenario.created_at)
        .bind(scenario.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(infrastructure)?;

        for card in &scenario.story_cards {
            insert_card_in(&mut tx, card).await?;
        }
        tx.commit().await.map_err(infrastructure)?;

        debug!(scenario_id = %scenario.id, cards = scenario.story_cards.len(), "scenario inserted");
        Ok(())
    }

    async fn get_scenario(&self, id: Uuid) -> Result<Option<Scenario>, DomainError> {
        let row = sqlx::query_as::<_, ScenarioRow>(
            "SELECT id, title, description, tags, status, plot, source_hash, created_at, \
             updated_at FROM scenarios WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;
        self.with_cards(row).await
    }

    async fn find_scenario_by_source_hash(
        &self,
        source_hash: &str,
    ) -> Result<Option<Scenario>, DomainError> {
        let row = sqlx::query_as::<_, ScenarioRow>(
            "SELECT id, title, description, tags, status, plot, source_hash, created_at, \
             updated_at FROM scenarios WHERE source_hash = $1",
        )
        .bind(source_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;
        self.with_cards(row).await
    }

    async fn list_scenarios(
        &self,
        status: Option<ScenarioStatus>,
    ) -> Result<Vec<Scenario>, DomainError> {
        sqlx::query_as::<_, ScenarioRow>(
            "SELECT id, title, description, tags, status, plot, source_hash, created_at, \
             updated_at FROM scenarios WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY updated_at DESC",
        )
        .bind(status.map(ScenarioStatus::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?
        .into_iter()
        .map(|row| row.into_scenario(Vec::new()))
        .collect()
    }

    async fn update_scenario(&self, scenario: &Scenario) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE scenarios SET title = $2, description = $3, tags = $4, status = $5, \
             plot = $6, source_hash = $7, updated_at = $8 WHERE id = $1",
        )
        .bind(scenario.id)
        .bind(&scenario.title)
        .bind(&scenario.description)
        .bind(&scenario.tags)
        .bind(scenario.status.as_str())
        .bind(Json(&scenario.plot))
        .bind(&scenario.source_hash)
        .bind(scenario.updated_at)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("scenario", scenario.id));
        }
        Ok(())
    }

    async fn delete_scenario(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM scenarios WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_card(&self, card: &StoryCard) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infrastructure)?;
        insert_card_in(&mut tx, card).await?;
        tx.commit().await.map_err(infrastructure)
    }

    async fn get_card(&self, id: Uuid) -> Result<Option<StoryCard>, DomainError> {
        sqlx::query_as::<_, StoryCardRow>(
            "SELECT id, scenario_id, card_type, name, entry, triggers, notes, created_at, \
             updated_at FROM story_cards WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?
        .map(StoryCard::try_from)
        .transpose()
    }

    async fn update_card(&self, card: &StoryCard) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE story_cards SET card_type = $2, name = $3, entry = $4, triggers = $5, \
             notes = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(card.id)
        .bind(card.card_type.as_str())
        .bind(&card.name)
        .bind(&card.entry)
        .bind(&card.triggers)
        .bind(&card.notes)
        .bind(card.updated_at)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("story_card", card.id));
        }
        Ok(())
    }

    async fn delete_card(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM story_cards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(result.rows_affected() > 0)
    }
}
