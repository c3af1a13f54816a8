//! Domain layer: commands and adventure seeding.

pub mod commands;
pub mod seed;
