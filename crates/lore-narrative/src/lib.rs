//! Lore — turn orchestration.
//!
//! Builds the bounded context the story director sees, parses its loosely
//! structured decision, asks each responding character for an in-voice
//! reply and merges everything into a recorded event with updated scene and
//! character state. Also hosts the other story-model tasks: opening scenes,
//! summaries, NPC drafting and free chat.

pub mod application;
pub mod domain;
