//! System prompts for each story-model task.
//!
//! Defaults are compiled in; a directory holding files with the same names
//! overrides them one by one.

use std::io;
use std::path::Path;

use tracing::info;

const STORY_DIRECTOR_FILE: &str = "story_director.md";
const CHARACTER_VOICE_FILE: &str = "character_voice.md";
const NPC_CREATION_FILE: &str = "npc_creation.md";
const SUMMARIZER_FILE: &str = "summarizer.md";
const CHAT_FILE: &str = "chat.md";

/// The system prompts in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub story_director: String,
    pub character_voice: String,
    pub npc_creation: String,
    pub summarizer: String,
    pub chat: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            story_director: include_str!("../../prompts/story_director.md").to_owned(),
            character_voice: include_str!("../../prompts/character_voice.md").to_owned(),
            npc_creation: include_str!("../../prompts/npc_creation.md").to_owned(),
            summarizer: include_str!("../../prompts/summarizer.md").to_owned(),
            chat: include_str!("../../prompts/chat.md").to_owned(),
        }
    }
}

impl PromptSet {
    /// Defaults, overridden by any prompt file present in `dir`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if an existing prompt file cannot be read.
    pub fn load(dir: Option<&Path>) -> io::Result<Self> {
        let mut prompts = Self::default();
        let Some(dir) = dir else {
            return Ok(prompts);
        };

        for (file, slot) in [
            (STORY_DIRECTOR_FILE, &mut prompts.story_director),
            (CHARACTER_VOICE_FILE, &mut prompts.character_voice),
            (NPC_CREATION_FILE, &mut prompts.npc_creation),
            (SUMMARIZER_FILE, &mut prompts.summarizer),
            (CHAT_FILE, &mut prompts.chat),
        ] {
            let path = dir.join(file);
            if path.is_file() {
                *slot = std::fs::read_to_string(&path)?;
                info!(path = %path.display(), "loaded prompt override");
            }
        }
        Ok(prompts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_compiled_in() {
        let prompts = PromptSet::default();

        assert!(prompts.story_director.contains("\"responding_characters\""));
        assert!(prompts.character_voice.contains("\"inner_thought\""));
        assert!(prompts.npc_creation.contains("\"personality_traits\""));
    }

    #[test]
    fn test_load_overrides_only_present_files() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("lore-prompts-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CHAT_FILE), "Talk like a pirate.").unwrap();

        // Act
        let prompts = PromptSet::load(Some(&dir)).unwrap();

        // Assert
        assert_eq!(prompts.chat, "Talk like a pirate.");
        assert_eq!(prompts.summarizer, PromptSet::default().summarizer);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_without_dir_returns_defaults() {
        assert_eq!(PromptSet::load(None).unwrap(), PromptSet::default());
    }
}
