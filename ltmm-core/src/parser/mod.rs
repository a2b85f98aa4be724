//! LTM tag parser.
//!
//! Scans free chat text for `LTM - ...` tags and decodes each occurrence
//! into an [`LtmEntry`]. Two grammars are recognised:
//!
//! ```text
//! canonical: LTM - <main>: <description> (<timestamp>) | <triggers> | <flag> | <order>
//! legacy:    LTM - <main>: <description> | <secondary> | <flag> | <key> | <order>
//! ```
//!
//! The text is cut into segments at every tag start, so a malformed tag can
//! never swallow the one after it. Each segment is tried against the
//! configured grammars in order and the first that matches decides; the two
//! grammars never both claim the same span.
//!
//! Parsing never fails. Unmatched text is skipped, and malformed fields inside
//! a matched tag are normalised (blank keywords dropped, bad numbers → 0,
//! unknown flags → not constant).

mod fields;

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::config::{GrammarConfig, GrammarMode, SecondaryField};
use crate::error::{LtmmError, Result};
use crate::types::{LtmEntry, TagGrammar};

pub use fields::{is_constant_flag, parse_order, split_keywords};

static TAG_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"LTM -").expect("valid regex"));

static CANONICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\ALTM -\s*(?P<main>[^:|\n]*):\s*(?P<desc>[^|]*?)\s*\((?P<ts>[^()|]*)\)\s*\|(?P<triggers>[^|]*)\|(?P<flag>[^|]*)\|\s*(?P<order>[^|\s]*)",
    )
    .expect("valid regex")
});

static LEGACY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\ALTM -\s*(?P<main>[^:|\n]*):\s*(?P<desc>[^|]*)\|(?P<secondary>[^|]*)\|(?P<flag>[^|]*)\|(?P<key>[^|]*)\|\s*(?P<order>[^|\s]*)",
    )
    .expect("valid regex")
});

/// Decodes LTM tags according to a [`GrammarConfig`].
#[derive(Debug, Clone, Default)]
pub struct TagParser {
    config: GrammarConfig,
}

impl TagParser {
    /// Create a parser with an explicit grammar configuration.
    #[must_use]
    pub fn new(config: GrammarConfig) -> Self {
        Self { config }
    }

    /// The grammar configuration in use.
    #[must_use]
    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }

    /// Extract every tag occurrence in `text`, left to right.
    ///
    /// Each call re-scans from the start of `text`.
    #[must_use]
    pub fn parse(&self, text: &str) -> Vec<LtmEntry> {
        let starts: Vec<usize> = TAG_START_RE.find_iter(text).map(|m| m.start()).collect();
        let mut entries = Vec::with_capacity(starts.len());

        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            let segment = &text[start..end];

            match self.parse_segment(segment) {
                Some(entry) => {
                    debug!(
                        keyword = %entry.main_keyword,
                        grammar = ?entry.grammar,
                        constant = entry.is_constant,
                        order = entry.order_value,
                        "Extracted LTM tag"
                    );
                    entries.push(entry);
                }
                None => trace!(offset = start, "Skipped malformed LTM tag"),
            }
        }

        entries
    }

    /// Like [`TagParser::parse`], but an empty result is an error.
    ///
    /// # Errors
    /// Returns [`LtmmError::Format`] when `text` holds no recognisable tag.
    pub fn parse_required(&self, text: &str) -> Result<Vec<LtmEntry>> {
        let entries = self.parse(text);
        if entries.is_empty() {
            return Err(LtmmError::Format);
        }
        Ok(entries)
    }

    /// The first tag occurrence in `text`, if any.
    #[must_use]
    pub fn parse_first(&self, text: &str) -> Option<LtmEntry> {
        self.parse(text).into_iter().next()
    }

    fn parse_segment(&self, segment: &str) -> Option<LtmEntry> {
        let grammars: &[TagGrammar] = match self.config.mode {
            GrammarMode::CanonicalThenLegacy => &[TagGrammar::Canonical, TagGrammar::Legacy],
            GrammarMode::CanonicalOnly => &[TagGrammar::Canonical],
            GrammarMode::LegacyOnly => &[TagGrammar::Legacy],
        };

        let (grammar, caps) = grammars.iter().find_map(|&grammar| {
            let re = match grammar {
                TagGrammar::Canonical => &*CANONICAL_RE,
                TagGrammar::Legacy => &*LEGACY_RE,
            };
            re.captures(segment).map(|caps| (grammar, caps))
        })?;

        let main = field(&caps, "main");
        if main.is_empty() {
            return None;
        }

        Some(match grammar {
            TagGrammar::Canonical => self.build_canonical(main, &caps),
            TagGrammar::Legacy => self.build_legacy(main, &caps),
        })
    }

    fn build_canonical(&self, main: &str, caps: &Captures<'_>) -> LtmEntry {
        let timestamp = Some(field(caps, "ts").to_string());
        LtmEntry::new(main, field(caps, "desc"), timestamp, TagGrammar::Canonical)
            .with_triggers(split_keywords(field(caps, "triggers")))
            .with_constant(is_constant_flag(
                field(caps, "flag"),
                &self.config.canonical_constant_markers,
            ))
            .with_order(parse_order(field(caps, "order")))
    }

    fn build_legacy(&self, main: &str, caps: &Captures<'_>) -> LtmEntry {
        let secondary = field(caps, "secondary");
        let mut keys = split_keywords(field(caps, "key"));
        let mut secondary_keyword = None;
        if !secondary.is_empty() {
            match self.config.legacy_secondary_field {
                SecondaryField::SecondaryKeys => secondary_keyword = Some(secondary.to_string()),
                SecondaryField::Keys => keys.push(secondary.to_string()),
            }
        }

        LtmEntry::new(main, field(caps, "desc"), None, TagGrammar::Legacy)
            .with_triggers(keys)
            .with_secondary(secondary_keyword)
            .with_constant(is_constant_flag(
                field(caps, "flag"),
                &self.config.legacy_constant_markers,
            ))
            .with_order(parse_order(field(caps, "order")))
    }
}

fn field<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map_or("", |m| m.as_str().trim())
}

/// Parse `text` with the default grammar configuration.
#[must_use]
pub fn parse(text: &str) -> Vec<LtmEntry> {
    TagParser::default().parse(text)
}
