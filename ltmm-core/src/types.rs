//! Core type definitions for LTMM.
//!
//! [`LtmEntry`] is the transient parser output; [`Uid`] and [`Position`] are
//! shared with the World Info record model.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LtmmError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Unique identifier of a World Info entry within one document.
///
/// Serialised as a plain integer; inside a document's entry map it becomes
/// the JSON object key (`"0"`, `"1"`, ...). Deserialisation accepts both
/// forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Uid(pub u64);

impl Serialize for Uid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UidVisitor;

        impl serde::de::Visitor<'_> for UidVisitor {
            type Value = Uid;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer UID")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Uid, E> {
                Ok(Uid(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Uid, E> {
                u64::try_from(v).map(Uid).map_err(|_| E::custom(format!("negative UID {v}")))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Uid, E> {
                v.trim()
                    .parse()
                    .map(Uid)
                    .map_err(|_| E::custom(format!("invalid UID '{v}'")))
            }
        }

        // Map keys arrive as strings, and documents with flattened fields
        // are buffered before decoding, so the concrete type is not known up front.
        deserializer.deserialize_any(UidVisitor)
    }
}

impl Uid {
    /// The UID following this one, or `None` once the UID space is exhausted.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Uid {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Where synthesised content is placed relative to the character definition.
///
/// Only [`Position::BeforeCharacter`] and [`Position::AfterCharacter`] can be
/// chosen by configuration. Host documents may hold other raw values written
/// by the host itself; those survive a load/save round trip as
/// [`Position::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Position {
    /// `0`: before the character definition block.
    #[default]
    BeforeCharacter,
    /// `1`: after the character definition block.
    AfterCharacter,
    /// Any other host-defined placement.
    Other(u8),
}

impl Position {
    /// Validate a configured position value. Only `0` and `1` are accepted.
    ///
    /// # Errors
    /// Returns [`LtmmError::InvalidPosition`] for any other value.
    pub fn from_setting(value: u8) -> Result<Self, LtmmError> {
        match value {
            0 => Ok(Self::BeforeCharacter),
            1 => Ok(Self::AfterCharacter),
            other => Err(LtmmError::InvalidPosition(other)),
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::BeforeCharacter => "before character",
            Self::AfterCharacter => "after character",
            Self::Other(_) => "host-defined",
        }
    }
}

impl From<u8> for Position {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::BeforeCharacter,
            1 => Self::AfterCharacter,
            other => Self::Other(other),
        }
    }
}

impl From<Position> for u8 {
    fn from(value: Position) -> Self {
        match value {
            Position::BeforeCharacter => 0,
            Position::AfterCharacter => 1,
            Position::Other(raw) => raw,
        }
    }
}

// ---------------------------------------------------------------------------
// Parser output
// ---------------------------------------------------------------------------

/// Which tag grammar produced an [`LtmEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagGrammar {
    /// `LTM - main: description (timestamp) | triggers | flag | order`
    Canonical,
    /// `LTM - main: description | secondary | flag | key | order`
    Legacy,
}

/// A structured record decoded from one LTM tag occurrence.
///
/// Created by one parse call and consumed by one integration call; never
/// persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LtmEntry {
    /// Primary topic label. Never empty.
    pub main_keyword: String,
    /// Free-text body. May be empty.
    pub description: String,
    /// Optional secondary trigger term.
    pub secondary_keyword: Option<String>,
    /// Additional trigger terms, in tag order. Not deduplicated.
    ///
    /// For [`TagGrammar::Legacy`] these are the terms of the `<key>` field and
    /// replace the main keyword as the record's primary keys.
    pub trigger_keywords: Vec<String>,
    /// Whether the entry is always active rather than keyword-triggered.
    pub is_constant: bool,
    /// Relative ordering weight among World Info entries.
    pub order_value: i64,
    /// Timestamp text from the canonical grammar's parenthesised group.
    pub timestamp: Option<String>,
    /// Grammar that matched.
    pub grammar: TagGrammar,
    /// Canonical display string, always rebuilt from the fields.
    pub rendered_content: String,
}

impl LtmEntry {
    /// Build an entry, synthesising `rendered_content` from the fields.
    #[must_use]
    pub fn new(
        main_keyword: impl Into<String>,
        description: impl Into<String>,
        timestamp: Option<String>,
        grammar: TagGrammar,
    ) -> Self {
        let main_keyword = main_keyword.into();
        let description = description.into();
        let rendered_content = render_content(&main_keyword, &description, timestamp.as_deref());
        Self {
            main_keyword,
            description,
            secondary_keyword: None,
            trigger_keywords: Vec::new(),
            is_constant: false,
            order_value: 0,
            timestamp,
            grammar,
            rendered_content,
        }
    }

    /// Set the trigger keywords.
    #[must_use]
    pub fn with_triggers(mut self, triggers: Vec<String>) -> Self {
        self.trigger_keywords = triggers;
        self
    }

    /// Set the secondary keyword.
    #[must_use]
    pub fn with_secondary(mut self, secondary: Option<String>) -> Self {
        self.secondary_keyword = secondary;
        self
    }

    /// Set the constant flag.
    #[must_use]
    pub fn with_constant(mut self, is_constant: bool) -> Self {
        self.is_constant = is_constant;
        self
    }

    /// Set the order value.
    #[must_use]
    pub fn with_order(mut self, order_value: i64) -> Self {
        self.order_value = order_value;
        self
    }

    /// Primary trigger keys for the synthesised record.
    ///
    /// Canonical tags key on the main keyword followed by the trigger list.
    /// Legacy tags key on their `<key>` field, falling back to the main
    /// keyword when that field was empty.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        match self.grammar {
            TagGrammar::Canonical => std::iter::once(self.main_keyword.clone())
                .chain(self.trigger_keywords.iter().cloned())
                .collect(),
            TagGrammar::Legacy if self.trigger_keywords.is_empty() => {
                vec![self.main_keyword.clone()]
            }
            TagGrammar::Legacy => self.trigger_keywords.clone(),
        }
    }

    /// Secondary trigger keys for the synthesised record.
    ///
    /// Legacy tags always carry the main keyword here, followed by the
    /// secondary keyword, so the main keyword stays a trigger even when the
    /// `<key>` field names other keys.
    #[must_use]
    pub fn secondary_keys(&self) -> Vec<String> {
        match self.grammar {
            TagGrammar::Canonical => self.secondary_keyword.iter().cloned().collect(),
            TagGrammar::Legacy => std::iter::once(self.main_keyword.clone())
                .chain(self.secondary_keyword.iter().cloned())
                .collect(),
        }
    }
}

/// Build the canonical display string `LTM - <main>: <description>` with an
/// optional ` (<timestamp>)` suffix.
#[must_use]
pub fn render_content(main_keyword: &str, description: &str, timestamp: Option<&str>) -> String {
    match timestamp {
        Some(ts) => format!("LTM - {main_keyword}: {description} ({ts})"),
        None => format!("LTM - {main_keyword}: {description}"),
    }
}
