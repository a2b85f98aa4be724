//! Runtime counters.
//!
//! Lock-free `AtomicU64` counters incremented on the hot path and read on
//! export.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for pipeline events.
#[derive(Debug)]
pub struct LtmmCounters {
    /// Messages scanned for tags.
    pub messages_scanned: AtomicU64,
    /// Tags extracted.
    pub tags_extracted: AtomicU64,
    /// World Info entries created.
    pub entries_integrated: AtomicU64,
    /// Entries that failed to integrate.
    pub integration_failures: AtomicU64,
    /// Documents written back to storage.
    pub documents_saved: AtomicU64,
}

impl LtmmCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages_scanned: AtomicU64::new(0),
            tags_extracted: AtomicU64::new(0),
            entries_integrated: AtomicU64::new(0),
            integration_failures: AtomicU64::new(0),
            documents_saved: AtomicU64::new(0),
        }
    }

    /// Add `n` to a counter.
    pub fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            messages_scanned: self.messages_scanned.load(Ordering::Relaxed),
            tags_extracted: self.tags_extracted.load(Ordering::Relaxed),
            entries_integrated: self.entries_integrated.load(Ordering::Relaxed),
            integration_failures: self.integration_failures.load(Ordering::Relaxed),
            documents_saved: self.documents_saved.load(Ordering::Relaxed),
        }
    }
}

impl Default for LtmmCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Messages scanned for tags.
    pub messages_scanned: u64,
    /// Tags extracted.
    pub tags_extracted: u64,
    /// World Info entries created.
    pub entries_integrated: u64,
    /// Entries that failed to integrate.
    pub integration_failures: u64,
    /// Documents written back to storage.
    pub documents_saved: u64,
}
