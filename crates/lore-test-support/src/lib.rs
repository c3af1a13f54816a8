//! Shared test doubles and utilities for the Lore story engine.

mod clock;
mod llm;
mod repository;

pub use clock::{FixedClock, fixed_time};
pub use llm::{FailingLlmClient, ScriptedLlmClient};
pub use repository::{FailingRepository, InMemoryStore};
