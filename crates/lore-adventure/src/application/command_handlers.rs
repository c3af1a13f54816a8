//! Command handlers for the adventure lifecycle.

use lore_core::clock::Clock;
use lore_core::error::DomainError;
use lore_core::model::{Adventure, StoryEvent};
use lore_core::repository::{AdventureRepository, ScenarioRepository};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::commands::{CreateAdventure, DeleteAdventure, UndoLastTurn, UpdateAdventure};
use crate::domain::seed::{initial_scene, seed_character_states};

/// Handles the `CreateAdventure` command: seeds one character state per
/// character card and an opening scene with the player characters present.
///
/// This is a creation command: the handler generates the `adventure_id`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the scenario does not exist, or a
/// repository error.
pub async fn handle_create_adventure(
    command: &CreateAdventure,
    clock: &dyn Clock,
    scenarios: &dyn ScenarioRepository,
    adventures: &dyn AdventureRepository,
) -> Result<Adventure, DomainError> {
    let scenario = scenarios
        .get_scenario(command.scenario_id)
        .await?
        .ok_or_else(|| DomainError::not_found("scenario", command.scenario_id))?;

    let now = clock.now();
    let title = command
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map_or_else(|| Adventure::default_title(&scenario.title), str::to_owned);
    let adventure = Adventure {
        id: Uuid::new_v4(),
        scenario_id: scenario.id,
        title,
        current_story_summary: scenario.plot.story_summary.clone(),
        memory: scenario.plot.plot_essentials.clone(),
        created_at: now,
        updated_at: now,
    };
    let scene = initial_scene(&scenario);
    let states = seed_character_states(adventure.id, &scenario);

    adventures.insert_adventure(&adventure, &scene, &states).await?;

    info!(
        adventure_id = %adventure.id,
        scenario_id = %scenario.id,
        characters = states.len(),
        "adventure created"
    );
    Ok(adventure)
}

/// Handles the `UpdateAdventure` command. Only provided fields change.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the adventure does not exist,
/// `DomainError::Validation` if a new title is blank, or a repository error.
pub async fn handle_update_adventure(
    command: &UpdateAdventure,
    clock: &dyn Clock,
    adventures: &dyn AdventureRepository,
) -> Result<Adventure, DomainError> {
    let mut adventure = adventures
        .get_adventure(command.adventure_id)
        .await?
        .ok_or_else(|| DomainError::not_found("adventure", command.adventure_id))?;

    if let Some(title) = &command.title {
        if title.trim().is_empty() {
            return Err(DomainError::Validation("title must not be blank".to_owned()));
        }
        title.trim().clone_into(&mut adventure.title);
    }
    if let Some(summary) = &command.current_story_summary {
        summary.clone_into(&mut adventure.current_story_summary);
    }
    if let Some(memory) = &command.memory {
        memory.clone_into(&mut adventure.memory);
    }
    adventure.updated_at = clock.now();

    adventures.update_adventure(&adventure).await?;
    Ok(adventure)
}

/// Handles the `DeleteAdventure` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if nothing was deleted, or a repository
/// error.
pub async fn handle_delete_adventure(
    command: &DeleteAdventure,
    adventures: &dyn AdventureRepository,
) -> Result<(), DomainError> {
    if adventures.delete_adventure(command.adventure_id).await? {
        info!(adventure_id = %command.adventure_id, "adventure deleted");
        Ok(())
    } else {
        Err(DomainError::not_found("adventure", command.adventure_id))
    }
}

/// Handles the `UndoLastTurn` command: removes the latest event and restores
/// the scene recorded by the event before it, or the opening scene when the
/// history becomes empty. Character states are left as they are.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the adventure does not exist,
/// `DomainError::Validation` if there is nothing to undo, or a repository
/// error.
pub async fn handle_undo_last_turn(
    command: &UndoLastTurn,
    clock: &dyn Clock,
    scenarios: &dyn ScenarioRepository,
    adventures: &dyn AdventureRepository,
) -> Result<StoryEvent, DomainError> {
    let adventure = adventures
        .get_adventure(command.adventure_id)
        .await?
        .ok_or_else(|| DomainError::not_found("adventure", command.adventure_id))?;
    let fallback = scenarios
        .get_scenario(adventure.scenario_id)
        .await?
        .map(|scenario| initial_scene(&scenario))
        .unwrap_or_default();

    let removed = adventures
        .undo_last_event(adventure.id, &fallback, clock.now())
        .await?
        .ok_or_else(|| DomainError::Validation("Nothing to undo".to_owned()))?;

    debug!(
        adventure_id = %adventure.id,
        sequence_number = removed.sequence_number,
        "turn undone"
    );
    Ok(removed)
}
