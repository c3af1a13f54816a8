//! Domain layer: commands, Markdown import and trigger matching.

pub mod commands;
pub mod import;
pub mod triggers;
