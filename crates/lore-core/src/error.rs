//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity (`scenario`, `story_card`, `adventure`, ...).
        entity: &'static str,
        /// The identifier that was looked up.
        id: Uuid,
    },

    /// Two writers raced for the same slot in an adventure's history.
    #[error("concurrency conflict on adventure {adventure_id}: sequence {sequence_number} already recorded")]
    ConcurrencyConflict {
        /// The adventure that had the conflict.
        adventure_id: Uuid,
        /// The sequence number that was already taken.
        sequence_number: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// A language-model backend failed or was unreachable.
    #[error("upstream model error: {0}")]
    Upstream(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for [`DomainError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}
