//! World Info document and entry record model.
//!
//! Field names follow the host's JSON schema (`key`, `keysecondary`,
//! `selectiveLogic`, ...). Fields this crate does not model are kept in a
//! flattened `extra` map so host-written documents survive a round trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::{LtmEntry, Position, Uid};

/// One World Info entry as persisted by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldInfoEntry {
    /// Unique identifier within the owning document.
    pub uid: Uid,
    /// Primary trigger keys.
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: Vec<String>,
    /// Secondary trigger keys.
    #[serde(default, rename = "keysecondary", deserialize_with = "null_as_default")]
    pub keysecondary: Vec<String>,
    /// Title shown in the host's editor.
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
    /// Text injected into the prompt.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Always active, regardless of keys.
    #[serde(default, deserialize_with = "null_as_default")]
    pub constant: bool,
    /// Insertion order weight.
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: i64,
    /// Placement relative to the character definition.
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: Position,
    /// Entry disabled.
    #[serde(default, deserialize_with = "null_as_default")]
    pub disable: bool,
    /// Secondary keys participate in matching.
    #[serde(default, deserialize_with = "null_as_default")]
    pub selective: bool,
    /// Logic combining primary and secondary keys.
    #[serde(default, deserialize_with = "null_as_default")]
    pub selective_logic: u8,
    /// Show the comment as a memo.
    #[serde(default, deserialize_with = "null_as_default")]
    pub add_memo: bool,
    /// Insertion depth for depth-based positions.
    #[serde(default, deserialize_with = "null_as_default")]
    pub depth: u32,
    /// Activation probability in percent.
    #[serde(default, deserialize_with = "null_as_default")]
    pub probability: u32,
    /// Whether `probability` is honoured.
    #[serde(default, deserialize_with = "null_as_default")]
    pub use_probability: bool,
    /// Inclusion group name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub group: String,
    /// Prioritise this entry within its group.
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_override: bool,
    /// Weight within its group.
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_weight: u32,
    /// Per-entry scan depth; `None` uses the global setting.
    #[serde(default)]
    pub scan_depth: Option<u32>,
    /// Case-sensitive key matching.
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    /// Whole-word key matching.
    #[serde(default)]
    pub match_whole_words: Option<bool>,
    /// Group scoring.
    #[serde(default)]
    pub use_group_scoring: Option<bool>,
    /// Automation hook identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub automation_id: String,
    /// Activated through vector search.
    #[serde(default, deserialize_with = "null_as_default")]
    pub vectorized: bool,
    /// Turns the entry stays active after triggering.
    #[serde(default, deserialize_with = "null_as_default")]
    pub sticky: u32,
    /// Turns before the entry can trigger again.
    #[serde(default, deserialize_with = "null_as_default")]
    pub cooldown: u32,
    /// Messages required before the entry can trigger.
    #[serde(default, deserialize_with = "null_as_default")]
    pub delay: u32,
    /// Not triggered by other entries' content.
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude_recursion: bool,
    /// Does not trigger other entries.
    #[serde(default, deserialize_with = "null_as_default")]
    pub prevent_recursion: bool,
    /// Only triggered during recursion.
    #[serde(default, deserialize_with = "null_as_default")]
    pub delay_until_recursion: bool,
    /// Ordering in the host's editor.
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_index: u64,
    /// Host fields not modelled here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorldInfoEntry {
    /// Synthesise a complete record from a parsed tag.
    ///
    /// Trigger data, display text and behaviour flags come from the entry;
    /// placement comes from the caller; every other field takes the host's
    /// neutral default. Keys are deduplicated keeping first occurrence.
    #[must_use]
    pub fn from_ltm(uid: Uid, entry: &LtmEntry, position: Position) -> Self {
        Self {
            uid,
            key: dedup(entry.keys()),
            keysecondary: dedup(entry.secondary_keys()),
            comment: entry.main_keyword.clone(),
            content: entry.rendered_content.clone(),
            constant: entry.is_constant,
            order: entry.order_value,
            position,
            disable: false,
            selective: true,
            selective_logic: 0,
            add_memo: true,
            depth: 4,
            probability: 100,
            use_probability: true,
            group: String::new(),
            group_override: false,
            group_weight: 100,
            scan_depth: None,
            case_sensitive: Some(false),
            match_whole_words: Some(false),
            use_group_scoring: Some(false),
            automation_id: String::new(),
            vectorized: false,
            sticky: 0,
            cooldown: 0,
            delay: 0,
            exclude_recursion: false,
            prevent_recursion: false,
            delay_until_recursion: false,
            display_index: uid.0,
            extra: Map::new(),
        }
    }
}

/// Host documents write `null` for unset scalars; decode it as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn dedup(keys: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keys.len());
    for key in keys {
        if !out.contains(&key) {
            out.push(key);
        }
    }
    out
}

/// A named World Info document (lorebook).
///
/// `entries` is `None` when the host handed over a document without an
/// entry collection; such a document is rejected by the integrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldInfoDocument {
    /// Entry records keyed by UID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<BTreeMap<Uid, WorldInfoEntry>>,
    /// Host fields not modelled here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorldInfoDocument {
    /// A document with an empty entry collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Some(BTreeMap::new()),
            extra: Map::new(),
        }
    }

    /// Parse a document from host JSON.
    ///
    /// # Errors
    /// Returns [`crate::LtmmError::Serialization`] if the JSON does not match the schema.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::LtmmError::Serialization(e.to_string()))
    }

    /// Serialise the document to host JSON.
    ///
    /// # Errors
    /// Returns [`crate::LtmmError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> crate::error::Result<String> {
        serde_json::to_string(self).map_err(|e| crate::LtmmError::Serialization(e.to_string()))
    }

    /// Number of entries (zero for a document without a collection).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, BTreeMap::len)
    }

    /// Whether the document holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up an entry by UID.
    #[must_use]
    pub fn get(&self, uid: Uid) -> Option<&WorldInfoEntry> {
        self.entries.as_ref()?.get(&uid)
    }

    /// The UID the next inserted entry receives: one past the largest
    /// existing UID, or `0` for an empty collection. `None` when the largest
    /// UID is already `u64::MAX`.
    #[must_use]
    pub fn next_uid(&self) -> Option<Uid> {
        self.entries
            .as_ref()
            .and_then(|entries| entries.keys().next_back().copied())
            .map_or(Some(Uid(0)), Uid::next)
    }
}

/// A set of named documents, standing in for the host's World Info list.
pub type WorldInfoLibrary = BTreeMap<String, WorldInfoDocument>;
