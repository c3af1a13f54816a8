//! Application layer: the turn coordinator and the other story-model
//! command handlers.

pub mod command_handlers;
mod turn;
