//! Lore — PostgreSQL persistence for scenarios and adventures.

pub mod pg_adventure_repository;
pub mod pg_scenario_repository;
mod rows;

pub use pg_adventure_repository::PgAdventureRepository;
pub use pg_scenario_repository::PgScenarioRepository;

/// Schema migrations, applied at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
