//! Integration tests for the PostgreSQL repositories.

use chrono::{DateTime, Duration, TimeZone, Utc};
use lore_core::error::DomainError;
use lore_core::model::{
    ActionType, Adventure, CharacterAction, CharacterState, Plot, Scenario, ScenarioStatus, Scene,
    SceneUpdate, StoryCard, StoryCardType, StoryEvent,
};
use lore_core::repository::{AdventureRepository, ScenarioRepository, TurnRecord};
use lore_store::{PgAdventureRepository, PgScenarioRepository};
use sqlx::PgPool;
use uuid::Uuid;

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, minute, 0).unwrap()
}

fn make_card(scenario_id: Uuid, name: &str, card_type: StoryCardType) -> StoryCard {
    StoryCard {
        id: Uuid::new_v4(),
        scenario_id,
        card_type,
        name: name.to_owned(),
        entry: format!("About {name}"),
        triggers: vec![name.to_lowercase()],
        notes: String::new(),
        created_at: at(0),
        updated_at: at(0),
    }
}

fn make_scenario(title: &str, status: ScenarioStatus, minute: u32) -> Scenario {
    let id = Uuid::new_v4();
    Scenario {
        id,
        title: title.to_owned(),
        description: "A drowned village.".to_owned(),
        tags: vec!["horror".to_owned(), "coastal".to_owned()],
        status,
        plot: Plot {
            story: "The bell tolls.".to_owned(),
            third_person: true,
            ..Plot::default()
        },
        story_cards: vec![
            make_card(id, "Aria", StoryCardType::PlayingCharacter),
            make_card(id, "Mira", StoryCardType::Character),
            make_card(id, "Bell Tower", StoryCardType::Location),
        ],
        source_hash: Some(format!("hash-{id}")),
        created_at: at(minute),
        updated_at: at(minute),
    }
}

fn make_adventure(scenario: &Scenario) -> Adventure {
    Adventure {
        id: Uuid::new_v4(),
        scenario_id: scenario.id,
        title: format!("Adventure in {}", scenario.title),
        current_story_summary: String::new(),
        memory: "The bell rings for the guilty.".to_owned(),
        created_at: at(1),
        updated_at: at(1),
    }
}

fn make_event(adventure_id: Uuid, sequence_number: i64, location: &str) -> StoryEvent {
    StoryEvent {
        id: Uuid::new_v4(),
        adventure_id,
        sequence_number,
        action_type: ActionType::DoSay,
        actor_name: "Aria".to_owned(),
        player_input: format!("step {sequence_number}"),
        narration: "The fog thickens.".to_owned(),
        character_actions: vec![CharacterAction {
            character_name: "Mira".to_owned(),
            action: "nods".to_owned(),
            speech: "Careful.".to_owned(),
            inner_thought: String::new(),
            is_pc: false,
        }],
        scene_update: Some(SceneUpdate {
            location_name: Some(location.to_owned()),
            ..SceneUpdate::default()
        }),
        scene_snapshot: Scene {
            location_name: location.to_owned(),
            characters_present: vec!["Aria".to_owned(), "Mira".to_owned()],
            ..Scene::default()
        },
        created_at: at(2),
    }
}

fn turn(event: StoryEvent, states: Vec<CharacterState>, minute: u32) -> TurnRecord {
    TurnRecord {
        scene: event.scene_snapshot.clone(),
        event,
        character_states: states,
        recorded_at: at(minute),
    }
}

async fn seed_adventure(pool: &PgPool) -> (Scenario, Adventure, PgAdventureRepository) {
    let scenarios = PgScenarioRepository::new(pool.clone());
    let adventures = PgAdventureRepository::new(pool.clone());
    let scenario = make_scenario("Saltmere", ScenarioStatus::Published, 0);
    scenarios.insert_scenario(&scenario).await.unwrap();
    let adventure = make_adventure(&scenario);
    let states = vec![
        CharacterState::new(adventure.id, "Aria", true),
        CharacterState::new(adventure.id, "Mira", false),
    ];
    adventures
        .insert_adventure(
            &adventure,
            &Scene::with_characters(vec!["Aria".to_owned()]),
            &states,
        )
        .await
        .unwrap();
    (scenario, adventure, adventures)
}

// --- scenarios ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_insert_and_get_scenario_with_cards_in_order(pool: PgPool) {
    let repo = PgScenarioRepository::new(pool);
    let scenario = make_scenario("Saltmere", ScenarioStatus::Draft, 0);

    repo.insert_scenario(&scenario).await.unwrap();
    let loaded = repo.get_scenario(scenario.id).await.unwrap().unwrap();

    assert_eq!(loaded, scenario);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_scenario_returns_none_for_unknown_id(pool: PgPool) {
    let repo = PgScenarioRepository::new(pool);

    assert!(repo.get_scenario(Uuid::new_v4()).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_find_scenario_by_source_hash(pool: PgPool) {
    let repo = PgScenarioRepository::new(pool);
    let scenario = make_scenario("Saltmere", ScenarioStatus::Draft, 0);
    repo.insert_scenario(&scenario).await.unwrap();

    let found = repo
        .find_scenario_by_source_hash(scenario.source_hash.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.id, scenario.id);
    assert_eq!(found.story_cards.len(), 3);
    assert!(
        repo.find_scenario_by_source_hash("missing")
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_scenarios_filters_by_status_newest_first(pool: PgPool) {
    // Arrange
    let repo = PgScenarioRepository::new(pool);
    let older = make_scenario("Older", ScenarioStatus::Published, 1);
    let newer = make_scenario("Newer", ScenarioStatus::Published, 5);
    let draft = make_scenario("Draft", ScenarioStatus::Draft, 9);
    for scenario in [&older, &newer, &draft] {
        repo.insert_scenario(scenario).await.unwrap();
    }

    // Act
    let published = repo
        .list_scenarios(Some(ScenarioStatus::Published))
        .await
        .unwrap();
    let all = repo.list_scenarios(None).await.unwrap();

    // Assert
    let titles: Vec<&str> = published.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Newer", "Older"]);
    assert!(published.iter().all(|s| s.story_cards.is_empty()));
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].title, "Draft");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_scenario_keeps_cards(pool: PgPool) {
    let repo = PgScenarioRepository::new(pool);
    let mut scenario = make_scenario("Saltmere", ScenarioStatus::Draft, 0);
    repo.insert_scenario(&scenario).await.unwrap();

    scenario.title = "Saltmere Revisited".to_owned();
    scenario.status = ScenarioStatus::Published;
    scenario.plot.authors_note = "Slow burn.".to_owned();
    scenario.updated_at = at(30);
    repo.update_scenario(&scenario).await.unwrap();

    let loaded = repo.get_scenario(scenario.id).await.unwrap().unwrap();
    assert_eq!(loaded, scenario);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_unknown_scenario_is_not_found(pool: PgPool) {
    let repo = PgScenarioRepository::new(pool);
    let scenario = make_scenario("Ghost", ScenarioStatus::Draft, 0);

    let result = repo.update_scenario(&scenario).await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_delete_scenario_cascades_to_cards_and_adventures(pool: PgPool) {
    // Arrange
    let scenarios = PgScenarioRepository::new(pool.clone());
    let (scenario, adventure, adventures) = seed_adventure(&pool).await;
    let card_id = scenario.story_cards[0].id;

    // Act
    let deleted = scenarios.delete_scenario(scenario.id).await.unwrap();
    let deleted_again = scenarios.delete_scenario(scenario.id).await.unwrap();

    // Assert
    assert!(deleted);
    assert!(!deleted_again);
    assert!(scenarios.get_card(card_id).await.unwrap().is_none());
    assert!(adventures.get_adventure(adventure.id).await.unwrap().is_none());
    assert!(
        adventures
            .list_character_states(adventure.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_card_crud(pool: PgPool) {
    // Arrange
    let repo = PgScenarioRepository::new(pool);
    let scenario = make_scenario("Saltmere", ScenarioStatus::Draft, 0);
    repo.insert_scenario(&scenario).await.unwrap();
    let mut card = make_card(scenario.id, "Tomas", StoryCardType::Character);

    // Act / Assert
    repo.insert_card(&card).await.unwrap();
    assert_eq!(repo.get_card(card.id).await.unwrap().unwrap(), card);

    card.entry = "A fisherman with a secret.".to_owned();
    card.card_type = StoryCardType::Faction;
    repo.update_card(&card).await.unwrap();
    assert_eq!(repo.get_card(card.id).await.unwrap().unwrap(), card);

    let loaded = repo.get_scenario(scenario.id).await.unwrap().unwrap();
    assert_eq!(loaded.story_cards.last().unwrap().name, "Tomas");

    assert!(repo.delete_card(card.id).await.unwrap());
    assert!(!repo.delete_card(card.id).await.unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_insert_card_for_unknown_scenario_fails(pool: PgPool) {
    let repo = PgScenarioRepository::new(pool);
    let card = make_card(Uuid::new_v4(), "Orphan", StoryCardType::Custom);

    let result = repo.insert_card(&card).await;

    assert!(matches!(result, Err(DomainError::Infrastructure(_))));
}

// --- adventures ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_insert_adventure_stores_scene_and_states(pool: PgPool) {
    let (_, adventure, repo) = seed_adventure(&pool).await;

    let loaded = repo.get_adventure(adventure.id).await.unwrap().unwrap();
    let scene = repo.get_scene(adventure.id).await.unwrap();
    let states = repo.list_character_states(adventure.id).await.unwrap();

    assert_eq!(loaded, adventure);
    assert_eq!(scene.characters_present, vec!["Aria"]);
    let names: Vec<&str> = states.iter().map(|s| s.character_name.as_str()).collect();
    assert_eq!(names, vec!["Aria", "Mira"]);
    assert!(states[0].is_pc);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_adventures_filters_by_scenario(pool: PgPool) {
    let (scenario, adventure, repo) = seed_adventure(&pool).await;

    let for_scenario = repo.list_adventures(Some(scenario.id)).await.unwrap();
    let for_other = repo.list_adventures(Some(Uuid::new_v4())).await.unwrap();
    let all = repo.list_adventures(None).await.unwrap();

    assert_eq!(for_scenario, vec![adventure]);
    assert!(for_other.is_empty());
    assert_eq!(all.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_and_delete_adventure(pool: PgPool) {
    let (_, mut adventure, repo) = seed_adventure(&pool).await;

    adventure.current_story_summary = "Aria reached the tower.".to_owned();
    adventure.updated_at = at(40);
    repo.update_adventure(&adventure).await.unwrap();

    assert_eq!(
        repo.get_adventure(adventure.id).await.unwrap().unwrap(),
        adventure
    );
    assert!(repo.delete_adventure(adventure.id).await.unwrap());
    assert!(!repo.delete_adventure(adventure.id).await.unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_record_turn_persists_event_scene_and_states(pool: PgPool) {
    // Arrange
    let (_, adventure, repo) = seed_adventure(&pool).await;
    let mut mira = CharacterState::new(adventure.id, "Mira", false);
    mira.current_mood = "wary".to_owned();
    let tomas = CharacterState::new(adventure.id, "Tomas", false);
    let event = make_event(adventure.id, 1, "The Docks");

    // Act
    repo.record_turn(&turn(event.clone(), vec![mira.clone(), tomas], 10))
        .await
        .unwrap();

    // Assert
    assert_eq!(repo.list_events(adventure.id).await.unwrap(), vec![event.clone()]);
    assert_eq!(repo.get_scene(adventure.id).await.unwrap(), event.scene_snapshot);
    let states = repo.list_character_states(adventure.id).await.unwrap();
    assert_eq!(states.len(), 3);
    let stored_mira = states.iter().find(|s| s.character_name == "Mira").unwrap();
    assert_eq!(stored_mira.current_mood, "wary");
    let loaded = repo.get_adventure(adventure.id).await.unwrap().unwrap();
    assert_eq!(loaded.updated_at, at(10));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_record_turn_upserts_states_by_name_ignoring_case(pool: PgPool) {
    // Arrange
    let (_, adventure, repo) = seed_adventure(&pool).await;
    let mut mira = CharacterState::new(adventure.id, "MIRA", false);
    mira.current_mood = "curious".to_owned();
    let event = make_event(adventure.id, 1, "The Docks");

    // Act
    repo.record_turn(&turn(event, vec![mira], 10)).await.unwrap();

    // Assert
    let states = repo.list_character_states(adventure.id).await.unwrap();
    assert_eq!(states.len(), 2);
    let stored = states.iter().find(|s| s.has_name("mira")).unwrap();
    assert_eq!(stored.current_mood, "curious");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_record_turn_duplicate_sequence_is_conflict(pool: PgPool) {
    // Arrange
    let (_, adventure, repo) = seed_adventure(&pool).await;
    repo.record_turn(&turn(make_event(adventure.id, 1, "The Docks"), Vec::new(), 10))
        .await
        .unwrap();
    let mut late = CharacterState::new(adventure.id, "Mira", false);
    late.current_mood = "furious".to_owned();

    // Act
    let result = repo
        .record_turn(&turn(make_event(adventure.id, 1, "The Chapel"), vec![late], 11))
        .await;

    // Assert
    assert!(matches!(
        result,
        Err(DomainError::ConcurrencyConflict {
            sequence_number: 1,
            ..
        })
    ));
    assert_eq!(repo.list_events(adventure.id).await.unwrap().len(), 1);
    assert_eq!(
        repo.get_scene(adventure.id).await.unwrap().location_name,
        "The Docks"
    );
    let states = repo.list_character_states(adventure.id).await.unwrap();
    assert!(states.iter().all(|s| s.current_mood.is_empty()));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_recent_events_returns_last_n_in_order(pool: PgPool) {
    let (_, adventure, repo) = seed_adventure(&pool).await;
    for n in 1..=5 {
        repo.record_turn(&turn(make_event(adventure.id, n, "The Docks"), Vec::new(), 10))
            .await
            .unwrap();
    }

    let recent = repo.recent_events(adventure.id, 3).await.unwrap();

    let sequence: Vec<i64> = recent.iter().map(|e| e.sequence_number).collect();
    assert_eq!(sequence, vec![3, 4, 5]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_undo_restores_previous_snapshot_then_fallback(pool: PgPool) {
    // Arrange
    let (_, adventure, repo) = seed_adventure(&pool).await;
    repo.record_turn(&turn(make_event(adventure.id, 1, "The Docks"), Vec::new(), 10))
        .await
        .unwrap();
    repo.record_turn(&turn(make_event(adventure.id, 2, "The Chapel"), Vec::new(), 11))
        .await
        .unwrap();
    let fallback = Scene::with_characters(vec!["Aria".to_owned()]);
    let later = at(12) + Duration::minutes(1);

    // Act
    let first = repo
        .undo_last_event(adventure.id, &fallback, later)
        .await
        .unwrap()
        .unwrap();
    let scene_after_first = repo.get_scene(adventure.id).await.unwrap();
    let second = repo
        .undo_last_event(adventure.id, &fallback, later)
        .await
        .unwrap()
        .unwrap();
    let scene_after_second = repo.get_scene(adventure.id).await.unwrap();
    let third = repo
        .undo_last_event(adventure.id, &fallback, later)
        .await
        .unwrap();

    // Assert
    assert_eq!(first.sequence_number, 2);
    assert_eq!(scene_after_first.location_name, "The Docks");
    assert_eq!(second.sequence_number, 1);
    assert_eq!(scene_after_second, fallback);
    assert!(third.is_none());
    let loaded = repo.get_adventure(adventure.id).await.unwrap().unwrap();
    assert_eq!(loaded.updated_at, later);
}
