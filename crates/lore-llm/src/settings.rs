//! Model settings, changeable at runtime.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::client::ModelRole;

/// Backend endpoint and model selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Base URL of the OpenAI-compatible API, e.g. `http://localhost:8080/v1`.
    pub api_base: String,
    /// Model used for story direction.
    pub story_model: String,
    /// Model used for character voices.
    pub character_model: String,
    /// Sampling temperature sent with every request.
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080/v1".to_owned(),
            story_model: "gemma-3-12b-it".to_owned(),
            character_model: "gemma-3-12b-it".to_owned(),
            temperature: 0.8,
            timeout_secs: 120,
        }
    }
}

impl LlmSettings {
    /// The model configured for `role`.
    #[must_use]
    pub fn model_for(&self, role: ModelRole) -> &str {
        match role {
            ModelRole::Story => &self.story_model,
            ModelRole::Character => &self.character_model,
        }
    }

    /// Full chat-completions endpoint derived from `api_base`.
    ///
    /// A base that already ends in `/chat/completions` is used as is.
    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        let base = self.api_base.trim().trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_owned()
        } else {
            format!("{base}/chat/completions")
        }
    }
}

/// Partial settings change. Blank model names are ignored; `api_base` is
/// applied whenever present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    /// New story model.
    #[serde(default)]
    pub story_model: Option<String>,
    /// New character model.
    #[serde(default)]
    pub character_model: Option<String>,
    /// New API base URL.
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Settings shared between the HTTP client and the settings endpoints.
#[derive(Debug, Clone, Default)]
pub struct SharedLlmSettings(Arc<RwLock<LlmSettings>>);

impl SharedLlmSettings {
    /// Wraps initial settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self(Arc::new(RwLock::new(settings)))
    }

    /// A copy of the current settings.
    #[must_use]
    pub fn snapshot(&self) -> LlmSettings {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Applies a partial update and returns the resulting settings.
    pub fn update(&self, update: &SettingsUpdate) -> LlmSettings {
        let mut settings = self.0.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = update.story_model.as_deref().map(str::trim) {
            if !model.is_empty() {
                model.clone_into(&mut settings.story_model);
            }
        }
        if let Some(model) = update.character_model.as_deref().map(str::trim) {
            if !model.is_empty() {
                model.clone_into(&mut settings.character_model);
            }
        }
        if let Some(api_base) = &update.api_base {
            api_base.trim().clone_into(&mut settings.api_base);
        }
        settings.clone()
    }
}
