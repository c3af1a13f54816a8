//! Lore — adventure lifecycle.
//!
//! Starts playthroughs of a scenario with seeded character states and an
//! opening scene, edits their metadata, undoes turns and serves read views.

pub mod application;
pub mod domain;
