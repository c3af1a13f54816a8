//! Lore — scenario and story card authoring.
//!
//! Responsible for scenario and story card CRUD, Markdown scenario import
//! with content hashing, and keyword-triggered card lookup.

pub mod application;
pub mod domain;
