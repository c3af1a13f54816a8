//! Lore Core — shared domain model and abstractions.
//!
//! This crate defines the domain types, repository traits and error type that
//! every other Lore crate depends on. It contains no infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod model;
pub mod repository;
