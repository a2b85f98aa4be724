//! Persisted extension settings.
//!
//! Mirrors the host's per-extension settings object. Missing fields take
//! their defaults, so an empty object loads as a fresh install.

use ltmm_core::config::GrammarConfig;
use ltmm_core::error::Result;
use ltmm_core::{LtmmConfig, Position, PromptBook};
use serde::{Deserialize, Serialize};
use tracing::info;

/// The extension's settings as stored by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionSettings {
    /// Whether tag processing is switched on.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Placement for new World Info records (`0` or `1`).
    #[serde(default)]
    position: u8,
    /// Document new entries go into when the caller names none.
    #[serde(default = "default_document")]
    pub document: String,
    /// Tag grammar options.
    #[serde(default)]
    pub grammar: GrammarConfig,
    /// Per-character prompts.
    #[serde(default, rename = "characterPrompts")]
    pub prompts: PromptBook,
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            position: 0,
            document: default_document(),
            grammar: GrammarConfig::default(),
            prompts: PromptBook::new(),
        }
    }
}

impl ExtensionSettings {
    /// Initial settings derived from a validated [`LtmmConfig`].
    #[must_use]
    pub fn from_config(config: &LtmmConfig) -> Self {
        Self {
            enabled: config.general.enabled,
            position: u8::from(config.position()),
            document: config.world_info.default_document.clone(),
            grammar: config.grammar.clone(),
            prompts: PromptBook::new(),
        }
    }

    /// Decode settings from the host's JSON object.
    ///
    /// An out-of-range stored position is reset to `0`.
    ///
    /// # Errors
    /// Returns `LtmmError::Serialization` on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut settings: Self = serde_json::from_str(json)
            .map_err(|e| ltmm_core::LtmmError::Serialization(e.to_string()))?;
        if Position::from_setting(settings.position).is_err() {
            settings.position = 0;
        }
        Ok(settings)
    }

    /// Encode settings for the host.
    ///
    /// # Errors
    /// Returns `LtmmError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ltmm_core::LtmmError::Serialization(e.to_string()))
    }

    /// The configured placement.
    #[must_use]
    pub fn position(&self) -> Position {
        Position::from_setting(self.position).unwrap_or_default()
    }

    /// Change the placement. Only `0` and `1` are accepted; anything else
    /// leaves the setting unchanged.
    ///
    /// # Errors
    /// Returns `LtmmError::InvalidPosition` for any other value.
    pub fn set_position(&mut self, value: u8) -> Result<()> {
        let position = Position::from_setting(value)?;
        self.position = value;
        info!(position = position.label(), "World Info position changed");
        Ok(())
    }
}

fn default_true() -> bool { true }
fn default_document() -> String { "LTM".to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use ltmm_core::LtmmError;

    #[test]
    fn empty_object_is_fresh_install() {
        let settings = ExtensionSettings::from_json("{}").expect("decode");
        assert!(settings.enabled);
        assert_eq!(settings.position(), Position::BeforeCharacter);
        assert!(settings.prompts.is_empty());
    }

    #[test]
    fn set_position_accepts_only_known_values() {
        let mut settings = ExtensionSettings::default();
        settings.set_position(1).expect("valid");
        assert_eq!(settings.position(), Position::AfterCharacter);

        let err = settings.set_position(2).expect_err("invalid");
        assert!(matches!(err, LtmmError::InvalidPosition(2)));
        assert_eq!(settings.position(), Position::AfterCharacter);
    }

    #[test]
    fn out_of_range_stored_position_resets() {
        let settings = ExtensionSettings::from_json(r#"{"position": 9}"#).expect("decode");
        assert_eq!(settings.position(), Position::BeforeCharacter);
    }

    #[test]
    fn host_json_round_trip() {
        let json = r#"{"position":1,"enabled":false,"characterPrompts":{"Alice":"formal"}}"#;
        let settings = ExtensionSettings::from_json(json).expect("decode");
        assert!(!settings.enabled);
        assert_eq!(settings.prompts.get("Alice"), "formal");

        let encoded = settings.to_json().expect("encode");
        let value: serde_json::Value = serde_json::from_str(&encoded).expect("json");
        assert_eq!(value["position"], 1);
        assert_eq!(value["characterPrompts"]["Alice"], "formal");
    }

    #[test]
    fn from_config_copies_sections() {
        let config = LtmmConfig::from_toml("[world_info]\nposition = 1\ndefault_document = \"Lore\"\n")
            .expect("config");
        let settings = ExtensionSettings::from_config(&config);
        assert_eq!(settings.position(), Position::AfterCharacter);
        assert_eq!(settings.document, "Lore");
    }
}
