//! Server-rendered pages and HTMX fragments, mounted under `/lore`.
//!
//! Full pages extend `base.html`; POST handlers return fragments that the
//! adventure page swaps into its history. Failures render `error.html` with
//! the status code the JSON API would use.

pub mod templates;

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use lore_adventure::application::command_handlers as adventure_commands;
use lore_adventure::application::query_handlers as adventure_queries;
use lore_adventure::domain::commands::{CreateAdventure, UndoLastTurn};
use lore_core::error::DomainError;
use lore_core::model::ActionType;
use lore_llm::SettingsUpdate;
use lore_narrative::application::command_handlers as narrative_commands;
use lore_narrative::domain::commands::{StartAdventure, TakeTurn};
use lore_scenario::application::query_handlers as scenario_queries;
use minijinja::context;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use self::templates::render;
use crate::error::{classify, log_if_server_error};
use crate::state::AppState;

/// HTML-layer wrapper around `DomainError` that renders the error fragment.
#[derive(Debug)]
pub struct PageError(pub DomainError);

impl From<DomainError> for PageError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, code) = classify(&self.0);
        log_if_server_error(status, &self.0);
        let message = self.0.to_string();

        match render(
            "error.html",
            &context! { status => status.as_u16(), code, message },
        ) {
            Ok(html) => (status, html).into_response(),
            Err(_) => (status, message).into_response(),
        }
    }
}

type PageResult = Result<Html<String>, PageError>;

/// Form body for starting an adventure.
#[derive(Debug, Default, Deserialize)]
pub struct PlayForm {
    #[serde(default)]
    pub title: Option<String>,
}

/// Form body for a player turn.
#[derive(Debug, Deserialize)]
pub struct ActionForm {
    pub player_input: String,
    #[serde(default)]
    pub action_type: ActionType,
}

/// Form body for the settings page. Blank fields leave a setting unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub api_base: Option<String>,
    pub story_model: Option<String>,
    pub character_model: Option<String>,
}

impl SettingsForm {
    fn into_update(self) -> SettingsUpdate {
        SettingsUpdate {
            story_model: self.story_model,
            character_model: self.character_model,
            api_base: self.api_base.filter(|base| !base.trim().is_empty()),
        }
    }
}

/// GET /lore
async fn home(State(state): State<AppState>) -> PageResult {
    let scenarios = scenario_queries::list_scenarios(None, &*state.scenarios).await?;
    let adventures = adventure_queries::list_adventures(None, &*state.adventures).await?;
    Ok(render("home.html", &context! { scenarios, adventures })?)
}

/// GET /lore/scenarios/{id}
#[instrument(skip(state))]
async fn scenario_page(
    State(state): State<AppState>,
    Path(scenario_id): Path<Uuid>,
) -> PageResult {
    let scenario = scenario_queries::get_scenario_by_id(scenario_id, &*state.scenarios).await?;
    let adventures =
        adventure_queries::list_adventures(Some(scenario_id), &*state.adventures).await?;
    Ok(render("scenario.html", &context! { scenario, adventures })?)
}

/// POST /lore/scenarios/{id}/play
#[instrument(skip(state, form))]
async fn play(
    State(state): State<AppState>,
    Path(scenario_id): Path<Uuid>,
    Form(form): Form<PlayForm>,
) -> Result<Redirect, PageError> {
    let command = CreateAdventure {
        correlation_id: Uuid::new_v4(),
        scenario_id,
        title: form.title,
    };

    info!(correlation_id = %command.correlation_id, "handling create_adventure command");

    let adventure = adventure_commands::handle_create_adventure(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
        &*state.adventures,
    )
    .await?;

    Ok(Redirect::to(&format!("/lore/adventures/{}", adventure.id)))
}

/// GET /lore/adventures/{id}
#[instrument(skip(state))]
async fn adventure_page(
    State(state): State<AppState>,
    Path(adventure_id): Path<Uuid>,
) -> PageResult {
    let adventure =
        adventure_queries::get_adventure_by_id(adventure_id, &*state.scenarios, &*state.adventures)
            .await?;
    let action_types = ActionType::ALL.map(ActionType::as_str);
    Ok(render("adventure.html", &context! { adventure, action_types })?)
}

/// POST /lore/adventures/{id}/start
#[instrument(skip(state))]
async fn start(State(state): State<AppState>, Path(adventure_id): Path<Uuid>) -> PageResult {
    let command = StartAdventure {
        correlation_id: Uuid::new_v4(),
        adventure_id,
    };

    info!(correlation_id = %command.correlation_id, "handling start_adventure command");

    let outcome = narrative_commands::handle_start_adventure(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
        &*state.adventures,
        &*state.llm,
        &state.prompts,
        &state.turn_settings,
    )
    .await?;

    Ok(render(
        "turn.html",
        &context! { event => outcome.event, scene => outcome.scene },
    )?)
}

/// POST /lore/adventures/{id}/action
#[instrument(skip(state, form), fields(action_type = %form.action_type))]
async fn action(
    State(state): State<AppState>,
    Path(adventure_id): Path<Uuid>,
    Form(form): Form<ActionForm>,
) -> PageResult {
    let command = TakeTurn {
        correlation_id: Uuid::new_v4(),
        adventure_id,
        action_type: form.action_type,
        input: form.player_input,
    };

    info!(correlation_id = %command.correlation_id, "handling take_turn command");

    let outcome = narrative_commands::handle_take_turn(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
        &*state.adventures,
        &*state.llm,
        &state.prompts,
        &state.turn_settings,
    )
    .await?;

    Ok(render(
        "turn.html",
        &context! { event => outcome.event, scene => outcome.scene },
    )?)
}

/// POST /lore/adventures/{id}/undo
#[instrument(skip(state))]
async fn undo(State(state): State<AppState>, Path(adventure_id): Path<Uuid>) -> PageResult {
    let command = UndoLastTurn {
        correlation_id: Uuid::new_v4(),
        adventure_id,
    };

    info!(correlation_id = %command.correlation_id, "handling undo_last_turn command");

    adventure_commands::handle_undo_last_turn(
        &command,
        state.clock.as_ref(),
        &*state.scenarios,
        &*state.adventures,
    )
    .await?;
    let view =
        adventure_queries::get_adventure_by_id(adventure_id, &*state.scenarios, &*state.adventures)
            .await?;

    Ok(render(
        "undo.html",
        &context! { history => view.history, scene => view.scene },
    )?)
}

/// GET /lore/settings
async fn settings_page(State(state): State<AppState>) -> PageResult {
    let settings = state.llm_settings.snapshot();
    Ok(render("settings.html", &context! { settings })?)
}

/// POST /lore/settings
#[instrument(skip(state, form))]
async fn save_settings(
    State(state): State<AppState>,
    Form(form): Form<SettingsForm>,
) -> PageResult {
    let settings = state.llm_settings.update(&form.into_update());
    info!(
        story_model = %settings.story_model,
        character_model = %settings.character_model,
        "model settings updated"
    );
    Ok(render(
        "settings_form.html",
        &context! { settings, saved => true },
    )?)
}

/// Returns the router for the HTML front end.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/scenarios/{id}", get(scenario_page))
        .route("/scenarios/{id}/play", post(play))
        .route("/adventures/{id}", get(adventure_page))
        .route("/adventures/{id}/start", post(start))
        .route("/adventures/{id}/action", post(action))
        .route("/adventures/{id}/undo", post(undo))
        .route("/settings", get(settings_page).post(save_settings))
}
