//! Character-order roster.
//!
//! An ordered list of `{id, name, order}` records from which a text prompt
//! is derived. All operations are plain state transitions; presentation
//! layers observe the result (see `ltmm-host`'s `RosterHandle`).
//!
//! Invariants:
//! - IDs increase monotonically and are never reused, even across
//!   [`Roster::reset`] and [`Roster::replace`].
//! - The roster never drops below one character through [`Roster::remove`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RosterConfig;
use crate::error::{LtmmError, Result};

/// One roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Stable identifier.
    pub id: u64,
    /// Display name; blank renders as the default name.
    pub name: String,
    /// Numeric order, starting at 1.
    pub order: u32,
    /// Whether this is the seeded default character.
    pub is_default: bool,
}

/// Externally supplied character data for [`Roster::replace`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDraft {
    /// Name; blank becomes the default name.
    #[serde(default)]
    pub name: String,
    /// Order; `0` becomes the row's 1-based index.
    #[serde(default)]
    pub order: u32,
}

/// Emitted when a row (or the whole roster) is synced to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEvent {
    /// The synced row, `None` for a whole-roster sync.
    pub character: Option<Character>,
    /// Every row at sync time.
    pub characters: Vec<Character>,
    /// Generated prompt at sync time.
    pub prompt: String,
}

/// The character-order roster.
#[derive(Debug, Clone)]
pub struct Roster {
    characters: Vec<Character>,
    next_id: u64,
    config: RosterConfig,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(RosterConfig::default())
    }
}

impl Roster {
    /// Create a roster seeded with the default character at order 1.
    #[must_use]
    pub fn new(config: RosterConfig) -> Self {
        let mut roster = Self {
            characters: Vec::new(),
            next_id: 0,
            config,
        };
        roster.seed_default();
        roster
    }

    fn seed_default(&mut self) {
        let id = self.allocate_id();
        self.characters.push(Character {
            id,
            name: self.config.default_name.clone(),
            order: 1,
            is_default: true,
        });
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn index_of(&self, id: u64) -> Result<usize> {
        self.characters
            .iter()
            .position(|c| c.id == id)
            .ok_or(LtmmError::CharacterNotFound(id))
    }

    /// All rows in display order.
    #[must_use]
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Look up a row by ID.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether the roster has no rows. Never true between operations:
    /// construction seeds the default row, `remove` refuses the last row and
    /// an empty `replace` re-seeds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Append an unnamed row ordered after every existing row.
    /// Returns the new row's ID.
    pub fn add(&mut self) -> u64 {
        let order = self
            .characters
            .iter()
            .map(|c| c.order)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        let id = self.allocate_id();
        self.characters.push(Character {
            id,
            name: String::new(),
            order,
            is_default: false,
        });
        debug!(id, order, "Added roster character");
        id
    }

    /// Rename a row.
    ///
    /// # Errors
    /// Returns [`LtmmError::CharacterNotFound`] for an unknown ID.
    pub fn rename(&mut self, id: u64, name: impl Into<String>) -> Result<()> {
        let index = self.index_of(id)?;
        self.characters[index].name = name.into();
        Ok(())
    }

    /// Set a row's order.
    ///
    /// # Errors
    /// Returns [`LtmmError::CharacterNotFound`] for an unknown ID.
    pub fn set_order(&mut self, id: u64, order: u32) -> Result<()> {
        let index = self.index_of(id)?;
        self.characters[index].order = order.max(1);
        Ok(())
    }

    /// Set a row's order from raw input text; anything that is not a
    /// positive integer becomes `1`.
    ///
    /// # Errors
    /// Returns [`LtmmError::CharacterNotFound`] for an unknown ID.
    pub fn set_order_text(&mut self, id: u64, text: &str) -> Result<()> {
        let order = text.trim().parse::<u32>().unwrap_or(1);
        self.set_order(id, order)
    }

    /// Remove a row, returning it.
    ///
    /// # Errors
    /// Returns [`LtmmError::LastCharacter`] if it is the only row, or
    /// [`LtmmError::CharacterNotFound`] for an unknown ID.
    pub fn remove(&mut self, id: u64) -> Result<Character> {
        let index = self.index_of(id)?;
        if self.characters.len() <= 1 {
            return Err(LtmmError::LastCharacter);
        }
        let removed = self.characters.remove(index);
        debug!(id, "Removed roster character");
        Ok(removed)
    }

    /// Move a row to `index` (clamped to the end).
    ///
    /// # Errors
    /// Returns [`LtmmError::CharacterNotFound`] for an unknown ID.
    pub fn move_to(&mut self, id: u64, index: usize) -> Result<()> {
        let from = self.index_of(id)?;
        let row = self.characters.remove(from);
        let to = index.min(self.characters.len());
        self.characters.insert(to, row);
        Ok(())
    }

    /// Replace every row with external data, normalising it. An empty
    /// input resets to the default character.
    pub fn replace(&mut self, drafts: Vec<CharacterDraft>) {
        if drafts.is_empty() {
            self.reset();
            return;
        }

        let default_name = self.config.default_name.clone();
        let characters: Vec<Character> = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                let order = if draft.order == 0 {
                    u32::try_from(index + 1).unwrap_or(u32::MAX)
                } else {
                    draft.order
                };
                // Only a row that already names the default character keeps the flag.
                let is_default = index == 0 && draft.name == default_name && order == 1;
                let name = if draft.name.trim().is_empty() {
                    default_name.clone()
                } else {
                    draft.name
                };
                Character {
                    id: self.allocate_id(),
                    name,
                    order,
                    is_default,
                }
            })
            .collect();
        self.characters = characters;
    }

    /// Drop every row and re-seed the default character.
    pub fn reset(&mut self) {
        self.characters.clear();
        self.seed_default();
    }

    /// Render the roster as prompt text, one `"<label>: <name>, Order: <n>"`
    /// line per row.
    #[must_use]
    pub fn generate_prompt(&self) -> String {
        let label = &self.config.name_label;
        let default_name = &self.config.default_name;
        self.characters
            .iter()
            .map(|c| {
                let name = if c.name.is_empty() { default_name } else { &c.name };
                format!("{label}: {name}, Order: {}", c.order)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Snapshot one row for the host.
    ///
    /// # Errors
    /// Returns [`LtmmError::CharacterNotFound`] for an unknown ID.
    pub fn sync(&self, id: u64) -> Result<SyncEvent> {
        let index = self.index_of(id)?;
        Ok(SyncEvent {
            character: Some(self.characters[index].clone()),
            characters: self.characters.clone(),
            prompt: self.generate_prompt(),
        })
    }

    /// Snapshot the whole roster for the host.
    #[must_use]
    pub fn sync_all(&self) -> SyncEvent {
        SyncEvent {
            character: None,
            characters: self.characters.clone(),
            prompt: self.generate_prompt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_default_character() {
        let roster = Roster::default();
        assert_eq!(roster.len(), 1);
        let first = &roster.characters()[0];
        assert_eq!(first.name, "{{char}}");
        assert_eq!(first.order, 1);
        assert!(first.is_default);
        assert_eq!(roster.generate_prompt(), "이름: {{char}}, Order: 1");
    }

    #[test]
    fn add_orders_after_max() {
        let mut roster = Roster::default();
        let first = roster.characters()[0].id;
        roster.set_order(first, 5).expect("order");
        let id = roster.add();
        assert_eq!(roster.get(id).map(|c| c.order), Some(6));
        assert!(id > first);
    }

    #[test]
    fn blank_names_render_as_default() {
        let mut roster = Roster::default();
        let id = roster.add();
        assert_eq!(
            roster.generate_prompt(),
            "이름: {{char}}, Order: 1\n이름: {{char}}, Order: 2"
        );
        roster.rename(id, "Alice").expect("rename");
        assert!(roster.generate_prompt().ends_with("이름: Alice, Order: 2"));
    }

    #[test]
    fn last_character_cannot_be_removed() {
        let mut roster = Roster::default();
        let only = roster.characters()[0].id;
        assert!(matches!(roster.remove(only), Err(LtmmError::LastCharacter)));

        let extra = roster.add();
        assert!(roster.remove(only).is_ok());
        assert!(matches!(roster.remove(extra), Err(LtmmError::LastCharacter)));
    }

    #[test]
    fn ids_never_reused() {
        let mut roster = Roster::default();
        let a = roster.add();
        roster.remove(a).expect("remove");
        let b = roster.add();
        assert!(b > a);
        roster.reset();
        assert!(roster.characters()[0].id > b);
    }

    #[test]
    fn order_text_falls_back_to_one() {
        let mut roster = Roster::default();
        let id = roster.characters()[0].id;
        roster.set_order_text(id, "abc").expect("order");
        assert_eq!(roster.get(id).map(|c| c.order), Some(1));
        roster.set_order_text(id, " 9 ").expect("order");
        assert_eq!(roster.get(id).map(|c| c.order), Some(9));
        roster.set_order_text(id, "0").expect("order");
        assert_eq!(roster.get(id).map(|c| c.order), Some(1));
    }

    #[test]
    fn unknown_id_reported() {
        let mut roster = Roster::default();
        assert!(matches!(roster.rename(99, "x"), Err(LtmmError::CharacterNotFound(99))));
        assert!(roster.sync(99).is_err());
    }

    #[test]
    fn move_reorders_rows() {
        let mut roster = Roster::default();
        let first = roster.characters()[0].id;
        let second = roster.add();
        roster.move_to(second, 0).expect("move");
        let ids: Vec<_> = roster.characters().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second, first]);
        roster.move_to(second, 100).expect("move");
        assert_eq!(roster.characters()[1].id, second);
    }

    #[test]
    fn replace_normalises_drafts() {
        let mut roster = Roster::default();
        roster.replace(vec![
            CharacterDraft { name: String::new(), order: 0 },
            CharacterDraft { name: "Bob".into(), order: 0 },
            CharacterDraft { name: "Eve".into(), order: 7 },
        ]);
        let rows = roster.characters();
        assert_eq!(rows[0].name, "{{char}}");
        assert!(!rows[0].is_default);
        assert_eq!(rows[1].order, 2);
        assert!(!rows[1].is_default);
        assert_eq!(rows[2].order, 7);

        roster.replace(Vec::new());
        assert_eq!(roster.len(), 1);
        assert!(roster.characters()[0].is_default);
    }

    #[test]
    fn replace_flags_only_an_explicit_default_row() {
        let mut roster = Roster::default();
        roster.replace(vec![
            CharacterDraft { name: "{{char}}".into(), order: 0 },
            CharacterDraft { name: "{{char}}".into(), order: 0 },
        ]);
        assert!(roster.characters()[0].is_default);
        assert!(!roster.characters()[1].is_default);

        roster.replace(vec![CharacterDraft { name: "   ".into(), order: 1 }]);
        assert_eq!(roster.characters()[0].name, "{{char}}");
        assert!(!roster.characters()[0].is_default);
    }

    #[test]
    fn no_operation_leaves_the_roster_empty() {
        let mut roster = Roster::default();
        assert!(!roster.is_empty());
        let only = roster.characters()[0].id;
        assert!(roster.remove(only).is_err());
        roster.replace(Vec::new());
        assert!(!roster.is_empty());
        roster.reset();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.generate_prompt(), "이름: {{char}}, Order: 1");
    }

    #[test]
    fn sync_carries_prompt() {
        let mut roster = Roster::default();
        let id = roster.add();
        roster.rename(id, "Alice").expect("rename");
        let event = roster.sync(id).expect("sync");
        assert_eq!(event.character.map(|c| c.name), Some("Alice".to_string()));
        assert_eq!(event.characters.len(), 2);
        assert_eq!(event.prompt, roster.generate_prompt());
        assert!(roster.sync_all().character.is_none());
    }

    #[test]
    fn custom_label() {
        let roster = Roster::new(RosterConfig {
            name_label: "Name".into(),
            ..RosterConfig::default()
        });
        assert_eq!(roster.generate_prompt(), "Name: {{char}}, Order: 1");
    }
}
