//! Domain model shared across the Lore crates.

pub mod adventure;
pub mod character;
pub mod history;
pub mod name;
pub mod scenario;
pub mod scene;

pub use adventure::Adventure;
pub use character::{CharacterState, CharacterUpdate, InventoryItem, Relationship};
pub use history::{ActionType, CharacterAction, StoryEvent};
pub use name::same_name;
pub use scenario::{Plot, Scenario, ScenarioStatus, StoryCard, StoryCardType};
pub use scene::{Scene, SceneUpdate};
