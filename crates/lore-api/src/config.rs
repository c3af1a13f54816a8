//! Server configuration read from the environment at startup.

use std::path::PathBuf;
use std::str::FromStr;

use lore_llm::LlmSettings;
use lore_narrative::application::command_handlers::TurnSettings;

use crate::error::AppError;

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct Config {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Initial model settings; changeable at runtime.
    pub llm: LlmSettings,
    /// Bearer token for the model backend, if it needs one.
    pub api_key: Option<String>,
    pub turn: TurnSettings,
    /// Directory overriding the built-in system prompts.
    pub prompts_dir: Option<PathBuf>,
    /// OTLP collector endpoint; span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable or `None` when it is unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or a numeric
    /// variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = value("DATABASE_URL").ok_or_else(|| {
            AppError::Config("DATABASE_URL environment variable must be set".to_owned())
        })?;

        let defaults = LlmSettings::default();
        let llm = LlmSettings {
            api_base: value("LORE_API_BASE").unwrap_or(defaults.api_base),
            story_model: value("LORE_STORY_MODEL").unwrap_or(defaults.story_model),
            character_model: value("LORE_CHARACTER_MODEL").unwrap_or(defaults.character_model),
            temperature: parse_or(
                value("LORE_TEMPERATURE"),
                "LORE_TEMPERATURE",
                defaults.temperature,
            )?,
            timeout_secs: parse_or(
                value("LORE_LLM_TIMEOUT_SECS"),
                "LORE_LLM_TIMEOUT_SECS",
                defaults.timeout_secs,
            )?,
        };

        let mut turn = TurnSettings::default();
        turn.context.max_context_chars = parse_or(
            value("LORE_MAX_CONTEXT_CHARS"),
            "LORE_MAX_CONTEXT_CHARS",
            turn.context.max_context_chars,
        )?;
        turn.max_responders = parse_or(
            value("LORE_MAX_RESPONDERS"),
            "LORE_MAX_RESPONDERS",
            turn.max_responders,
        )?;

        Ok(Self {
            database_url,
            host: value("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parse_or(value("PORT"), "PORT", 3000)?,
            llm,
            api_key: value("LORE_API_KEY"),
            turn,
            prompts_dir: value("LORE_PROMPTS_DIR").map(PathBuf::from),
            otlp_endpoint: value("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}
