//! Command handlers for scenario authoring.
//!
//! Each handler validates its command, stamps timestamps from the injected
//! clock and persists through the `ScenarioRepository`.

use lore_core::clock::Clock;
use lore_core::error::DomainError;
use lore_core::model::{Scenario, StoryCard};
use lore_core::repository::ScenarioRepository;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::commands::{
    CardDraft, CreateScenario, CreateStoryCard, DeleteScenario, DeleteStoryCard, ImportScenario,
    UpdateScenario, UpdateStoryCard,
};
use crate::domain::import::parse_scenario_document;

/// Outcome of an import: the scenario and whether it was newly created.
#[derive(Debug)]
pub struct ImportResult {
    pub scenario: Scenario,
    /// `false` when an identical document had already been imported.
    pub created: bool,
}

fn require_non_blank(value: &str, field: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}

fn card_from_draft(
    scenario_id: Uuid,
    draft: CardDraft,
    clock: &dyn Clock,
) -> Result<StoryCard, DomainError> {
    require_non_blank(&draft.name, "card name")?;
    let now = clock.now();
    Ok(StoryCard {
        id: Uuid::new_v4(),
        scenario_id,
        card_type: draft.card_type,
        name: draft.name.trim().to_owned(),
        entry: draft.entry,
        triggers: draft.triggers,
        notes: draft.notes,
        created_at: now,
        updated_at: now,
    })
}

fn assemble_scenario(
    command: CreateScenario,
    source_hash: Option<String>,
    clock: &dyn Clock,
) -> Result<Scenario, DomainError> {
    require_non_blank(&command.title, "title")?;
    let scenario_id = Uuid::new_v4();
    let now = clock.now();
    let story_cards = command
        .story_cards
        .into_iter()
        .map(|draft| card_from_draft(scenario_id, draft, clock))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Scenario {
        id: scenario_id,
        title: command.title.trim().to_owned(),
        description: command.description,
        tags: command.tags,
        status: command.status,
        plot: command.plot,
        story_cards,
        source_hash,
        created_at: now,
        updated_at: now,
    })
}

/// Handles the `CreateScenario` command.
///
/// This is a creation command: the handler generates the `scenario_id`.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the title or a card name is blank,
/// or a repository error if persisting fails.
pub async fn handle_create_scenario(
    command: &CreateScenario,
    clock: &dyn Clock,
    repo: &dyn ScenarioRepository,
) -> Result<Scenario, DomainError> {
    let scenario = assemble_scenario(command.clone(), None, clock)?;
    let scenario_id = scenario.id;
    repo.insert_scenario(&scenario).await?;

    debug!(%scenario_id, cards = scenario.story_cards.len(), "scenario created");
    Ok(scenario)
}

/// Handles the `UpdateScenario` command. Only provided fields change.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the scenario does not exist,
/// `DomainError::Validation` if a new title is blank, or a repository error.
pub async fn handle_update_scenario(
    command: &UpdateScenario,
    clock: &dyn Clock,
    repo: &dyn ScenarioRepository,
) -> Result<Scenario, DomainError> {
    let mut scenario = repo
        .get_scenario(command.scenario_id)
        .await?
        .ok_or_else(|| DomainError::not_found("scenario", command.scenario_id))?;

    if let Some(title) = &command.title {
        require_non_blank(title, "title")?;
        title.trim().clone_into(&mut scenario.title);
    }
    if let Some(description) = &command.description {
        description.clone_into(&mut scenario.description);
    }
    if let Some(tags) = &command.tags {
        scenario.tags.clone_from(tags);
    }
    if let Some(status) = command.status {
        scenario.status = status;
    }
    if let Some(plot) = &command.plot {
        plot.apply_to(&mut scenario.plot);
    }
    scenario.updated_at = clock.now();

    repo.update_scenario(&scenario).await?;
    Ok(scenario)
}

/// Handles the `DeleteScenario` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if nothing was deleted, or a repository
/// error.
pub async fn handle_delete_scenario(
    command: &DeleteScenario,
    repo: &dyn ScenarioRepository,
) -> Result<(), DomainError> {
    if repo.delete_scenario(command.scenario_id).await? {
        info!(scenario_id = %command.scenario_id, "scenario deleted");
        Ok(())
    } else {
        Err(DomainError::not_found("scenario", command.scenario_id))
    }
}

/// Handles the `CreateStoryCard` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the scenario does not exist,
/// `DomainError::Validation` if the card name is blank, or a repository error.
pub async fn handle_create_story_card(
    command: &CreateStoryCard,
    clock: &dyn Clock,
    repo: &dyn ScenarioRepository,
) -> Result<StoryCard, DomainError> {
    let scenario = repo
        .get_scenario(command.scenario_id)
        .await?
        .ok_or_else(|| DomainError::not_found("scenario", command.scenario_id))?;

    let card = card_from_draft(scenario.id, command.card.clone(), clock)?;
    repo.insert_card(&card).await?;
    Ok(card)
}

/// Handles the `UpdateStoryCard` command. Only provided fields change.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the card does not exist,
/// `DomainError::Validation` if a new name is blank, or a repository error.
pub async fn handle_update_story_card(
    command: &UpdateStoryCard,
    clock: &dyn Clock,
    repo: &dyn ScenarioRepository,
) -> Result<StoryCard, DomainError> {
    let mut card = repo
        .get_card(command.card_id)
        .await?
        .ok_or_else(|| DomainError::not_found("story_card", command.card_id))?;

    if let Some(name) = &command.name {
        require_non_blank(name, "card name")?;
        name.trim().clone_into(&mut card.name);
    }
    if let Some(card_type) = command.card_type {
        card.card_type = card_type;
    }
    if let Some(entry) = &command.entry {
        entry.clone_into(&mut card.entry);
    }
    if let Some(triggers) = &command.triggers {
        card.triggers.clone_from(triggers);
    }
    if let Some(notes) = &command.notes {
        notes.clone_into(&mut card.notes);
    }
    card.updated_at = clock.now();

    repo.update_card(&card).await?;
    Ok(card)
}

/// Handles the `DeleteStoryCard` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if nothing was deleted, or a repository
/// error.
pub async fn handle_delete_story_card(
    command: &DeleteStoryCard,
    repo: &dyn ScenarioRepository,
) -> Result<(), DomainError> {
    if repo.delete_card(command.card_id).await? {
        Ok(())
    } else {
        Err(DomainError::not_found("story_card", command.card_id))
    }
}

/// Handles the `ImportScenario` command: parses the document and creates a
/// scenario from it, unless a document with the same hash was imported
/// before, in which case the existing scenario is returned.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the document cannot be parsed, or a
/// repository error.
pub async fn handle_import_scenario(
    command: &ImportScenario,
    clock: &dyn Clock,
    repo: &dyn ScenarioRepository,
) -> Result<ImportResult, DomainError> {
    let document = parse_scenario_document(&command.source)?;

    if let Some(existing) = repo
        .find_scenario_by_source_hash(&document.source_hash)
        .await?
    {
        info!(
            scenario_id = %existing.id,
            source_hash = %document.source_hash,
            "document already imported"
        );
        return Ok(ImportResult {
            scenario: existing,
            created: false,
        });
    }

    let create = CreateScenario {
        correlation_id: command.correlation_id,
        title: document.title,
        description: document.description,
        tags: document.tags,
        status: document.status,
        plot: document.plot,
        story_cards: document.cards,
    };
    let source_hash = document.source_hash;
    let scenario = assemble_scenario(create, Some(source_hash.clone()), clock)?;
    let scenario_id = scenario.id;
    if let Err(err) = repo.insert_scenario(&scenario).await {
        // A concurrent import of the same document holds the hash.
        if let Some(existing) = repo.find_scenario_by_source_hash(&source_hash).await? {
            info!(
                scenario_id = %existing.id,
                %source_hash,
                "document imported concurrently"
            );
            return Ok(ImportResult {
                scenario: existing,
                created: false,
            });
        }
        return Err(err);
    }

    info!(%scenario_id, cards = scenario.story_cards.len(), "scenario imported");
    Ok(ImportResult {
        scenario,
        created: true,
    })
}
