//! World Info integration: folds parsed tags into a document.
//!
//! ## Algorithm
//!
//! 1. Reject a document without an entry collection.
//! 2. Compute the new UID: one past the largest existing UID, `0` when empty.
//!    UIDs of deleted entries are never recycled. A document whose largest
//!    UID is `u64::MAX` is rejected unchanged.
//! 3. Synthesise the record ([`WorldInfoEntry::from_ltm`]) with the caller's
//!    [`Position`].
//! 4. Insert it and hand the UID back. Persisting is the caller's job.
//!
//! Content oddities (no triggers, zero order, ...) are never errors.
//!
//! ## Batches
//!
//! Entries are integrated one at a time in extraction order. Each
//! integration is complete on its own, so a failure is recorded in the
//! [`BatchReport`] and the remaining entries still go in.

use tracing::{debug, warn};

use crate::error::{LtmmError, Result};
use crate::types::{LtmEntry, Position, Uid};
use crate::world_info::{WorldInfoDocument, WorldInfoEntry, WorldInfoLibrary};

/// Integrate one entry into `document`, returning the UID it was stored under.
///
/// # Errors
/// Returns [`LtmmError::Validation`] if the document has no entry collection.
pub fn integrate(
    document: &mut WorldInfoDocument,
    entry: &LtmEntry,
    position: Position,
) -> Result<Uid> {
    integrate_named("", document, entry, position)
}

fn integrate_named(
    name: &str,
    document: &mut WorldInfoDocument,
    entry: &LtmEntry,
    position: Position,
) -> Result<Uid> {
    let Some(uid) = document.next_uid() else {
        return Err(LtmmError::validation(name, "UID space exhausted"));
    };
    let Some(entries) = document.entries.as_mut() else {
        return Err(LtmmError::validation(name, "document has no entries collection"));
    };

    let record = WorldInfoEntry::from_ltm(uid, entry, position);
    entries.insert(uid, record);

    debug!(
        document = name,
        uid = %uid,
        keyword = %entry.main_keyword,
        position = position.label(),
        "Created World Info entry"
    );
    Ok(uid)
}

/// A World Info entry created during a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEntry {
    /// Target document name (empty for single-document batches).
    pub document: String,
    /// UID assigned to the new record.
    pub uid: Uid,
    /// Main keyword of the source tag.
    pub keyword: String,
}

/// An entry that could not be integrated.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the entry in the batch.
    pub index: usize,
    /// Main keyword of the source tag.
    pub keyword: String,
    /// Why it failed.
    pub error: LtmmError,
}

/// Outcome of integrating several entries.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Number of entries successfully integrated.
    pub succeeded: usize,
    /// Entries created, in batch order.
    pub created: Vec<CreatedEntry>,
    /// Entries that failed, in batch order.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// Total number of entries attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// Whether every attempted entry went in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, index: usize, document: &str, entry: &LtmEntry, outcome: Result<Uid>) {
        match outcome {
            Ok(uid) => {
                self.succeeded += 1;
                self.created.push(CreatedEntry {
                    document: document.to_string(),
                    uid,
                    keyword: entry.main_keyword.clone(),
                });
            }
            Err(error) => {
                warn!(
                    document,
                    index,
                    keyword = %entry.main_keyword,
                    error = %error,
                    "Failed to integrate LTM entry"
                );
                self.failures.push(BatchFailure {
                    index,
                    keyword: entry.main_keyword.clone(),
                    error,
                });
            }
        }
    }
}

/// Integrate several entries into one document, in order.
pub fn integrate_batch<'a>(
    document: &mut WorldInfoDocument,
    entries: impl IntoIterator<Item = &'a LtmEntry>,
    position: Position,
) -> BatchReport {
    let mut report = BatchReport::default();
    for (index, entry) in entries.into_iter().enumerate() {
        let outcome = integrate_named("", document, entry, position);
        report.record(index, "", entry, outcome);
    }
    report
}

/// One entry bound for a named document.
#[derive(Debug, Clone)]
pub struct IntegrationJob {
    /// Target document name.
    pub document: String,
    /// Entry to integrate.
    pub entry: LtmEntry,
}

impl IntegrationJob {
    /// Create a job.
    #[must_use]
    pub fn new(document: impl Into<String>, entry: LtmEntry) -> Self {
        Self {
            document: document.into(),
            entry,
        }
    }
}

/// Integrate entries into the named documents of a library, in order.
///
/// A job naming a missing document fails with [`LtmmError::NotFound`]; a
/// job whose document has no entry collection fails with
/// [`LtmmError::Validation`]. Neither stops the remaining jobs.
pub fn integrate_jobs(
    library: &mut WorldInfoLibrary,
    jobs: impl IntoIterator<Item = IntegrationJob>,
    position: Position,
) -> BatchReport {
    let mut report = BatchReport::default();
    for (index, job) in jobs.into_iter().enumerate() {
        let outcome = match library.get_mut(&job.document) {
            Some(document) => integrate_named(&job.document, document, &job.entry, position),
            None => Err(LtmmError::NotFound(job.document.clone())),
        };
        report.record(index, &job.document, &job.entry, outcome);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagGrammar;

    fn entry(keyword: &str) -> LtmEntry {
        LtmEntry::new(keyword, "details", Some("t".into()), TagGrammar::Canonical)
            .with_triggers(vec!["x".into()])
            .with_constant(true)
            .with_order(5)
    }

    #[test]
    fn empty_document_starts_at_zero() {
        let mut doc = WorldInfoDocument::new();
        let uid = integrate(&mut doc, &entry("A"), Position::BeforeCharacter).expect("integrate");
        assert_eq!(uid, Uid(0));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn integrated_record_mirrors_entry() {
        let mut doc = WorldInfoDocument::new();
        let e = entry("Alice");
        let uid = integrate(&mut doc, &e, Position::AfterCharacter).expect("integrate");
        let record = doc.get(uid).expect("record");
        assert_eq!(record.comment, e.main_keyword);
        assert_eq!(record.content, e.rendered_content);
        assert_eq!(record.constant, e.is_constant);
        assert_eq!(record.order, e.order_value);
        assert_eq!(record.position, Position::AfterCharacter);
        assert_eq!(record.key, vec!["Alice", "x"]);
    }

    #[test]
    fn uid_exceeds_existing_max_without_recycling() {
        let mut doc = WorldInfoDocument::new();
        for _ in 0..3 {
            integrate(&mut doc, &entry("A"), Position::default()).expect("integrate");
        }
        // Delete the middle entry; the gap must not be reused.
        doc.entries.as_mut().expect("entries").remove(&Uid(1));
        let uid = integrate(&mut doc, &entry("B"), Position::default()).expect("integrate");
        assert_eq!(uid, Uid(3));
    }

    #[test]
    fn exhausted_uid_space_rejected_without_overwriting() {
        let mut doc = WorldInfoDocument::new();
        integrate(&mut doc, &entry("zero"), Position::default()).expect("integrate");
        let top = WorldInfoEntry::from_ltm(Uid(u64::MAX), &entry("top"), Position::default());
        doc.entries.as_mut().expect("entries").insert(Uid(u64::MAX), top);
        let before = doc.clone();

        let err = integrate(&mut doc, &entry("New"), Position::default()).expect_err("exhausted");
        assert!(matches!(err, LtmmError::Validation { ref reason, .. } if reason.contains("exhausted")));
        assert_eq!(doc, before);
        assert_eq!(doc.get(Uid(0)).map(|e| e.comment.as_str()), Some("zero"));
    }

    #[test]
    fn existing_records_untouched() {
        let mut doc = WorldInfoDocument::new();
        integrate(&mut doc, &entry("A"), Position::default()).expect("integrate");
        let before = doc.get(Uid(0)).cloned();
        integrate(&mut doc, &entry("B"), Position::AfterCharacter).expect("integrate");
        assert_eq!(doc.get(Uid(0)).cloned(), before);
    }

    #[test]
    fn missing_entries_collection_rejected() {
        let mut doc = WorldInfoDocument::default();
        let err = integrate(&mut doc, &entry("A"), Position::default()).expect_err("invalid");
        assert!(matches!(err, LtmmError::Validation { .. }));
        assert!(doc.entries.is_none());
    }

    #[test]
    fn batch_preserves_extraction_order() {
        let mut doc = WorldInfoDocument::new();
        let entries = [entry("A"), entry("B"), entry("C")];
        let report = integrate_batch(&mut doc, &entries, Position::default());
        assert_eq!(report.succeeded, 3);
        assert!(report.is_complete());
        let order: Vec<_> = report.created.iter().map(|c| (c.uid, c.keyword.as_str())).collect();
        assert_eq!(order, vec![(Uid(0), "A"), (Uid(1), "B"), (Uid(2), "C")]);
    }

    #[test]
    fn batch_continues_past_failures() {
        let mut library = WorldInfoLibrary::new();
        library.insert("Lore".to_string(), WorldInfoDocument::new());

        let jobs = vec![
            IntegrationJob::new("Lore", entry("A")),
            IntegrationJob::new("Missing", entry("B")),
            IntegrationJob::new("Lore", entry("C")),
            IntegrationJob::new("Lore", entry("D")),
        ];
        let report = integrate_jobs(&mut library, jobs, Position::default());

        assert_eq!(report.succeeded, 3);
        assert_eq!(report.attempted(), 4);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert!(matches!(report.failures[0].error, LtmmError::NotFound(ref name) if name == "Missing"));
        assert_eq!(library["Lore"].len(), 3);
    }

    #[test]
    fn three_valid_and_one_invalid_document() {
        let mut library = WorldInfoLibrary::new();
        library.insert("Lore".to_string(), WorldInfoDocument::new());
        library.insert("Broken".to_string(), WorldInfoDocument::default());

        let jobs = vec![
            IntegrationJob::new("Lore", entry("A")),
            IntegrationJob::new("Lore", entry("B")),
            IntegrationJob::new("Broken", entry("X")),
            IntegrationJob::new("Lore", entry("C")),
        ];
        let report = integrate_jobs(&mut library, jobs, Position::default());

        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 2);
        assert!(matches!(report.failures[0].error, LtmmError::Validation { .. }));
        assert_eq!(library["Lore"].len(), 3);
        assert!(library["Broken"].entries.is_none());
    }

    #[test]
    fn invalid_document_in_library_reports_validation() {
        let mut library = WorldInfoLibrary::new();
        library.insert("Broken".to_string(), WorldInfoDocument::default());
        let report = integrate_jobs(
            &mut library,
            vec![IntegrationJob::new("Broken", entry("A"))],
            Position::default(),
        );
        assert_eq!(report.succeeded, 0);
        assert!(matches!(
            report.failures[0].error,
            LtmmError::Validation { ref document, .. } if document == "Broken"
        ));
    }
}
