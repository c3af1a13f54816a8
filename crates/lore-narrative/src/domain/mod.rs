//! Domain layer: prompts, context assembly and model-output parsing.

pub mod commands;
pub mod context;
pub mod decision;
pub mod lenient;
pub mod npc;
pub mod prompts;
pub mod voice;
