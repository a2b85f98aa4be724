//! Async World Info service.
//!
//! Runs the load → parse → integrate → save cycle for one message against a
//! [`WorldInfoStore`]. Cycles on the same document are serialised by a
//! per-document async lock, so concurrent messages can never allocate the
//! same UID or overwrite each other's entries. Cycles on different documents
//! run in parallel. Store calls are blocking and run on tokio's blocking pool.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use ltmm_core::integrator::{BatchReport, integrate_batch};
use ltmm_core::metrics::{CounterSnapshot, LtmmCounters};
use ltmm_core::persistence::WorldInfoStore;
use ltmm_core::{LtmmError, TagParser};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::chat::{ChatMessage, last_user_message};
use crate::error::{HostError, Result};
use crate::settings::ExtensionSettings;

type DocumentLock = Arc<tokio::sync::Mutex<()>>;

/// Processes LTM tags into stored World Info documents.
pub struct LtmService<S> {
    store: Arc<S>,
    settings: RwLock<ExtensionSettings>,
    locks: Mutex<HashMap<String, DocumentLock>>,
    counters: LtmmCounters,
}

impl<S> std::fmt::Debug for LtmService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LtmService")
            .field("settings", &*self.settings.read())
            .field("counters", &self.counters.snapshot())
            .finish_non_exhaustive()
    }
}

impl<S: WorldInfoStore + 'static> LtmService<S> {
    /// Create a service over `store`.
    #[must_use]
    pub fn new(store: S, settings: ExtensionSettings) -> Self {
        Self::with_shared_store(Arc::new(store), settings)
    }

    /// Create a service over a store shared with other components.
    #[must_use]
    pub fn with_shared_store(store: Arc<S>, settings: ExtensionSettings) -> Self {
        Self {
            store,
            settings: RwLock::new(settings),
            locks: Mutex::new(HashMap::new()),
            counters: LtmmCounters::new(),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// A copy of the current settings.
    #[must_use]
    pub fn settings(&self) -> ExtensionSettings {
        self.settings.read().clone()
    }

    /// Mutate settings in place. Takes effect for the next message.
    pub fn update_settings<T>(&self, f: impl FnOnce(&mut ExtensionSettings) -> T) -> T {
        f(&mut self.settings.write())
    }

    /// Counter values so far.
    #[must_use]
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Extract every tag in `text` and integrate it into `document`.
    ///
    /// The document is saved once, after the whole batch, if at least one
    /// entry went in.
    ///
    /// # Errors
    /// - [`HostError::Disabled`] when the extension is off.
    /// - `LtmmError::Format` when `text` holds no tag.
    /// - `LtmmError::NotFound` when the store has no such document.
    /// - Storage failures from the store.
    pub async fn process_message(&self, document: &str, text: &str) -> Result<BatchReport> {
        let start = Instant::now();
        let (parser, position) = {
            let settings = self.settings.read();
            if !settings.enabled {
                return Err(HostError::Disabled);
            }
            (TagParser::new(settings.grammar.clone()), settings.position())
        };

        LtmmCounters::add(&self.counters.messages_scanned, 1);
        let entries = parser.parse_required(text)?;
        LtmmCounters::add(&self.counters.tags_extracted, entries.len());

        let lock = self.document_lock(document);
        let _guard = lock.lock().await;

        let store = Arc::clone(&self.store);
        let name = document.to_string();
        let loaded = tokio::task::spawn_blocking(move || store.load(&name)).await??;
        let mut doc = loaded.ok_or_else(|| LtmmError::NotFound(document.to_string()))?;

        let report = integrate_batch(&mut doc, &entries, position);
        LtmmCounters::add(&self.counters.entries_integrated, report.succeeded);
        LtmmCounters::add(&self.counters.integration_failures, report.failures.len());

        if report.succeeded > 0 {
            let store = Arc::clone(&self.store);
            let name = document.to_string();
            tokio::task::spawn_blocking(move || store.save(&name, &doc)).await??;
            LtmmCounters::add(&self.counters.documents_saved, 1);
        } else {
            warn!(document, failures = report.failures.len(), "No entries integrated; document not saved");
        }

        info!(
            document,
            created = report.succeeded,
            failed = report.failures.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Processed LTM message"
        );
        Ok(report)
    }

    /// Slash-command entry point.
    ///
    /// Uses `argument` when it is non-blank, otherwise the most recent user
    /// message in `chat`. `document` defaults to the configured document.
    ///
    /// # Errors
    /// [`HostError::NoInput`] when there is nothing to process, otherwise as
    /// [`LtmService::process_message`].
    pub async fn process_command(
        &self,
        document: Option<&str>,
        argument: Option<&str>,
        chat: &[ChatMessage],
    ) -> Result<BatchReport> {
        let text = argument
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .or_else(|| last_user_message(chat))
            .ok_or(HostError::NoInput)?;

        let document = match document.map(str::trim).filter(|d| !d.is_empty()) {
            Some(name) => name.to_string(),
            None => self.settings.read().document.clone(),
        };
        debug!(document = %document, from_argument = argument.is_some(), "LTM command");
        self.process_message(&document, text).await
    }

    fn document_lock(&self, document: &str) -> DocumentLock {
        let mut locks = self.locks.lock();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(document.to_string()).or_default())
    }
}
