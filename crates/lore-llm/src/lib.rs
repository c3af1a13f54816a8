//! Lore LLM — language-model access for the story engine.
//!
//! Two model roles share one OpenAI-compatible backend: the story model
//! (orchestration, summaries, NPC drafts) and the character model (voices).
//! Which model serves which role can be changed at runtime through
//! [`SharedLlmSettings`].

pub mod client;
pub mod openai;
pub mod settings;

pub use client::{CompletionRequest, LlmClient, LlmError, ModelRole};
pub use openai::OpenAiCompatibleClient;
pub use settings::{LlmSettings, SettingsUpdate, SharedLlmSettings};
