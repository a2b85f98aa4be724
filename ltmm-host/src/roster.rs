//! Observable character-order roster.
//!
//! Wraps a core [`Roster`] and republishes the generated prompt on a
//! `tokio::sync::watch` channel after every change, so presentation layers
//! subscribe instead of being called back.

use ltmm_core::error::Result;
use ltmm_core::roster::{CharacterDraft, SyncEvent};
use ltmm_core::Roster;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

/// Shared roster with a live prompt feed.
#[derive(Debug)]
pub struct RosterHandle {
    roster: Mutex<Roster>,
    prompt: watch::Sender<String>,
}

impl Default for RosterHandle {
    fn default() -> Self {
        Self::new(Roster::default())
    }
}

impl RosterHandle {
    /// Wrap `roster`, publishing its current prompt.
    #[must_use]
    pub fn new(roster: Roster) -> Self {
        let (prompt, _) = watch::channel(roster.generate_prompt());
        Self {
            roster: Mutex::new(roster),
            prompt,
        }
    }

    /// Subscribe to prompt updates. The receiver starts at the current prompt.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.prompt.subscribe()
    }

    /// The current prompt.
    #[must_use]
    pub fn prompt(&self) -> String {
        self.prompt.borrow().clone()
    }

    /// A copy of the current roster.
    #[must_use]
    pub fn snapshot(&self) -> Roster {
        self.roster.lock().clone()
    }

    /// Apply `f` to the roster and publish the new prompt if it changed.
    pub fn update<T>(&self, f: impl FnOnce(&mut Roster) -> T) -> T {
        let mut roster = self.roster.lock();
        let out = f(&mut roster);
        let next = roster.generate_prompt();
        let changed = self.prompt.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            debug!(characters = roster.len(), "Roster prompt updated");
        }
        out
    }

    /// Append a row. Returns its ID.
    pub fn add(&self) -> u64 {
        self.update(Roster::add)
    }

    /// Rename a row.
    ///
    /// # Errors
    /// `LtmmError::CharacterNotFound` for an unknown ID.
    pub fn rename(&self, id: u64, name: &str) -> Result<()> {
        self.update(|r| r.rename(id, name))
    }

    /// Set a row's order from raw input text.
    ///
    /// # Errors
    /// `LtmmError::CharacterNotFound` for an unknown ID.
    pub fn set_order_text(&self, id: u64, text: &str) -> Result<()> {
        self.update(|r| r.set_order_text(id, text))
    }

    /// Remove a row.
    ///
    /// # Errors
    /// `LtmmError::LastCharacter` or `LtmmError::CharacterNotFound`.
    pub fn remove(&self, id: u64) -> Result<()> {
        self.update(|r| r.remove(id).map(|_| ()))
    }

    /// Replace every row with external data.
    pub fn replace(&self, drafts: Vec<CharacterDraft>) {
        self.update(|r| r.replace(drafts));
    }

    /// Reset to the default character.
    pub fn reset(&self) {
        self.update(Roster::reset);
    }

    /// Snapshot one row for the host.
    ///
    /// # Errors
    /// `LtmmError::CharacterNotFound` for an unknown ID.
    pub fn sync(&self, id: u64) -> Result<SyncEvent> {
        self.roster.lock().sync(id)
    }
}
