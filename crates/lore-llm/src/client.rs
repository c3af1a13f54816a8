//! The `LlmClient` seam and its request/error types.

use std::fmt;

use async_trait::async_trait;
use lore_core::error::DomainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which configured model should serve a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    /// Narration, orchestration decisions, summaries and NPC drafts.
    Story,
    /// In-character dialogue and actions.
    Character,
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Story => "story",
            Self::Character => "character",
        })
    }
}

/// A single system + user round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Model role to route the request to.
    pub role: ModelRole,
    /// System prompt; omitted from the wire request when empty.
    pub system: String,
    /// User message.
    pub user: String,
}

impl CompletionRequest {
    /// Request for the story model.
    #[must_use]
    pub fn story(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            role: ModelRole::Story,
            system: system.into(),
            user: user.into(),
        }
    }

    /// Request for the character model.
    #[must_use]
    pub fn character(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            role: ModelRole::Character,
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Errors returned by language-model clients.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport failure: connection refused, timeout, bad body.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the body.
        message: String,
    },

    /// The backend answered but produced no text.
    #[error("empty or missing content in response")]
    EmptyResponse,

    /// The client could not be built from its settings.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<LlmError> for DomainError {
    fn from(err: LlmError) -> Self {
        DomainError::Upstream(err.to_string())
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends one request and returns the model's text reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
