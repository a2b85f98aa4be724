//! Per-character prompt book.
//!
//! Free-text prompts keyed by character name, saved alongside the extension
//! settings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{LtmmError, Result};

/// Character name → prompt text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptBook {
    prompts: BTreeMap<String, String>,
}

impl PromptBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Save (or overwrite) the prompt for `character`.
    ///
    /// # Errors
    /// Returns [`LtmmError::Validation`] when the character name is blank.
    pub fn save(&mut self, character: &str, prompt: impl Into<String>) -> Result<()> {
        let character = character.trim();
        if character.is_empty() {
            return Err(LtmmError::validation("prompts", "character name is required"));
        }
        self.prompts.insert(character.to_string(), prompt.into());
        info!(character, "Saved character prompt");
        Ok(())
    }

    /// The prompt for `character`, or `""` when none is saved.
    #[must_use]
    pub fn get(&self, character: &str) -> &str {
        self.prompts.get(character.trim()).map_or("", String::as_str)
    }

    /// Delete the prompt for `character`. Returns `true` if one existed.
    pub fn delete(&mut self, character: &str) -> bool {
        let removed = self.prompts.remove(character.trim()).is_some();
        if removed {
            info!(character, "Deleted character prompt");
        }
        removed
    }

    /// Iterate over `(character, prompt)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prompts.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of saved prompts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Whether no prompts are saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// A list-view preview: the first `max_chars` characters, with `...`
    /// appended when the prompt is longer.
    #[must_use]
    pub fn preview(&self, character: &str, max_chars: usize) -> String {
        let prompt = self.get(character);
        let mut preview: String = prompt.chars().take(max_chars).collect();
        if prompt.chars().count() > max_chars {
            preview.push_str("...");
        }
        preview
    }
}
