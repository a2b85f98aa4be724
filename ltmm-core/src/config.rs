//! Configuration for the LTMM pipeline.
//!
//! Maps directly to `ltmm.toml`. Every section and field has a default, so
//! an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::{LtmmError, Result};
use crate::types::Position;

/// Top-level LTMM configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LtmmConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// World Info integration settings.
    #[serde(default)]
    pub world_info: WorldInfoConfig,
    /// Tag grammar selection and field mapping.
    #[serde(default)]
    pub grammar: GrammarConfig,
    /// Character-order roster settings.
    #[serde(default)]
    pub roster: RosterConfig,
    /// Document storage settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl LtmmConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `LtmmError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| LtmmError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    /// Returns `LtmmError::Config` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        Position::from_setting(self.world_info.position)
            .map_err(|e| LtmmError::Config(e.to_string()))?;
        if self.world_info.default_document.trim().is_empty() {
            return Err(LtmmError::Config(
                "world_info.default_document must not be empty".to_string(),
            ));
        }
        if self.grammar.canonical_constant_markers.iter().any(|m| m.trim().is_empty())
            || self.grammar.legacy_constant_markers.iter().any(|m| m.trim().is_empty())
        {
            return Err(LtmmError::Config(
                "grammar constant markers must not be blank".to_string(),
            ));
        }
        if self.roster.default_name.trim().is_empty() {
            return Err(LtmmError::Config("roster.default_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// The configured placement for new World Info records.
    ///
    /// Falls back to [`Position::BeforeCharacter`] for an unvalidated,
    /// out-of-range value.
    #[must_use]
    pub fn position(&self) -> Position {
        Position::from_setting(self.world_info.position).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether tag processing is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// World Info integration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldInfoConfig {
    /// Placement of new entries: 0 = before character, 1 = after character.
    #[serde(default)]
    pub position: u8,
    /// Document written to when the caller names none.
    #[serde(default = "default_document")]
    pub default_document: String,
}

impl Default for WorldInfoConfig {
    fn default() -> Self {
        Self {
            position: 0,
            default_document: default_document(),
        }
    }
}

/// Which grammars the parser tries, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarMode {
    /// Canonical (timestamp) grammar first, legacy grammar as fallback.
    #[default]
    CanonicalThenLegacy,
    /// Canonical grammar only.
    CanonicalOnly,
    /// Legacy grammar only.
    LegacyOnly,
}

/// Where the legacy grammar's third field is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryField {
    /// Into the record's secondary keys.
    #[default]
    SecondaryKeys,
    /// Appended to the record's primary keys.
    Keys,
}

/// Tag grammar selection and field mapping.
///
/// Source tags disagree on which literal marks an entry constant and where
/// the legacy secondary field belongs, so both are explicit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarConfig {
    /// Grammar selection.
    #[serde(default)]
    pub mode: GrammarMode,
    /// Flag values meaning "constant" in the canonical grammar.
    #[serde(default = "default_canonical_markers")]
    pub canonical_constant_markers: Vec<String>,
    /// Flag values meaning "constant" in the legacy grammar.
    #[serde(default = "default_legacy_markers")]
    pub legacy_constant_markers: Vec<String>,
    /// Routing of the legacy third field.
    #[serde(default)]
    pub legacy_secondary_field: SecondaryField,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            mode: GrammarMode::default(),
            canonical_constant_markers: default_canonical_markers(),
            legacy_constant_markers: default_legacy_markers(),
            legacy_secondary_field: SecondaryField::default(),
        }
    }
}

/// Character-order roster settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Name of the seeded default character.
    #[serde(default = "default_character_name")]
    pub default_name: String,
    /// Label printed before each name in the generated prompt.
    #[serde(default = "default_name_label")]
    pub name_label: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            default_name: default_character_name(),
            name_label: default_name_label(),
        }
    }
}

/// Document storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Backend: "sqlite" or "memory".
    #[serde(default = "default_sqlite")]
    pub backend: String,
    /// Database path for the sqlite backend.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Detect stored-document corruption via checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: default_sqlite(),
            path: default_db_path(),
            wal_mode: true,
            checksum_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_document() -> String { "LTM".to_string() }
fn default_canonical_markers() -> Vec<String> { vec!["1".to_string()] }
fn default_legacy_markers() -> Vec<String> { vec!["A".to_string()] }
fn default_character_name() -> String { "{{char}}".to_string() }
fn default_name_label() -> String { "이름".to_string() }
fn default_sqlite() -> String { "sqlite".to_string() }
fn default_db_path() -> String { "ltmm.db".to_string() }
