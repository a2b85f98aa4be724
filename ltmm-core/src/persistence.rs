//! World Info document storage.
//!
//! The host owns its documents; [`WorldInfoStore`] is the seam through which
//! a caller loads a named document, integrates entries in memory and writes
//! it back. Two in-process stores are provided:
//!
//! - [`MemoryStore`]: a map behind a lock, for tests and embedding.
//! - [`SqliteStore`]: one row per document, JSON in a BLOB column:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS world_info (
//!     name       TEXT PRIMARY KEY,
//!     data       BLOB NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! Stores do not serialise concurrent load/save cycles on the same
//! document; callers hold a per-document lock around the whole cycle.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::{debug, info, warn};

use crate::config::PersistenceConfig;
use crate::error::{LtmmError, Result};
use crate::world_info::WorldInfoDocument;

/// Load/save access to named World Info documents.
pub trait WorldInfoStore: Send + Sync {
    /// Load a document. `Ok(None)` when no document has that name.
    ///
    /// # Errors
    /// Backend or decoding failures.
    fn load(&self, name: &str) -> Result<Option<WorldInfoDocument>>;

    /// Save (create or overwrite) a document.
    ///
    /// # Errors
    /// Backend or encoding failures.
    fn save(&self, name: &str, document: &WorldInfoDocument) -> Result<()>;

    /// Delete a document. Returns `true` if one existed.
    ///
    /// # Errors
    /// Backend failures.
    fn delete(&self, name: &str) -> Result<bool>;

    /// Names of all stored documents, sorted.
    ///
    /// # Errors
    /// Backend failures.
    fn list(&self) -> Result<Vec<String>>;
}

/// Open the store selected by `config.backend`.
///
/// # Errors
/// Returns [`LtmmError::Config`] for an unknown backend, or the backend's
/// own open error.
pub fn open_store(config: &PersistenceConfig) -> Result<Box<dyn WorldInfoStore>> {
    match config.backend.as_str() {
        "memory" => Ok(Box::new(MemoryStore::new())),
        "sqlite" => Ok(Box::new(SqliteStore::open(&config.path, config)?)),
        other => Err(LtmmError::Config(format!("unknown persistence backend '{other}'"))),
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Documents held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, WorldInfoDocument>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with documents.
    #[must_use]
    pub fn with_documents(documents: impl IntoIterator<Item = (String, WorldInfoDocument)>) -> Self {
        Self {
            documents: RwLock::new(documents.into_iter().collect()),
        }
    }
}

impl WorldInfoStore for MemoryStore {
    fn load(&self, name: &str) -> Result<Option<WorldInfoDocument>> {
        Ok(self.documents.read().get(name).cloned())
    }

    fn save(&self, name: &str, document: &WorldInfoDocument) -> Result<()> {
        self.documents.write().insert(name.to_string(), document.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.documents.write().remove(name).is_some())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.documents.read().keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 (ISO 3309) of `data` as lowercase hex.
fn crc32_hex(data: &[u8]) -> String {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    format!("{:08x}", !crc)
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS world_info (
    name       TEXT PRIMARY KEY,
    data       BLOB NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

/// Documents stored in an SQLite database.
///
/// # Usage
///
/// ```no_run
/// # use ltmm_core::persistence::{SqliteStore, WorldInfoStore};
/// # use ltmm_core::config::PersistenceConfig;
/// # use ltmm_core::WorldInfoDocument;
/// let store = SqliteStore::open("ltmm.db", &PersistenceConfig::default())?;
/// store.save("Campaign", &WorldInfoDocument::new())?;
/// let loaded = store.load("Campaign")?;
/// # Ok::<(), ltmm_core::LtmmError>(())
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database at `path`, creating the schema.
    ///
    /// # Errors
    /// Returns [`LtmmError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "World Info store opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
            db_path,
        })
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns [`LtmmError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Path to the database file (`:memory:` for in-memory databases).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Copy the database to `dest_path` with SQLite's online-backup API.
    ///
    /// # Errors
    /// Returns [`LtmmError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let conn = self.conn.lock();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;

        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "World Info backup completed"
        );
        Ok(())
    }

    /// Run SQLite's integrity check. `Ok(false)` means corruption.
    ///
    /// # Errors
    /// Returns [`LtmmError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}

impl WorldInfoStore for SqliteStore {
    fn load(&self, name: &str) -> Result<Option<WorldInfoDocument>> {
        let start = Instant::now();
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT data, checksum FROM world_info WHERE name = ?1")?;
        let row: Option<(Vec<u8>, Option<String>)> = stmt
            .query_row(params![name], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((data, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.config.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(&data);
                if expected != actual {
                    warn!(
                        document = name,
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch; possible storage corruption"
                    );
                }
            }
        }

        let document: WorldInfoDocument =
            serde_json::from_slice(&data).map_err(|e| LtmmError::Serialization(e.to_string()))?;

        debug!(
            document = name,
            entries = document.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded World Info document"
        );
        Ok(Some(document))
    }

    fn save(&self, name: &str, document: &WorldInfoDocument) -> Result<()> {
        let start = Instant::now();
        let json = serde_json::to_vec(document).map_err(|e| LtmmError::Serialization(e.to_string()))?;
        let checksum = self.config.checksum_enabled.then(|| crc32_hex(&json));
        let now = Utc::now().to_rfc3339();

        self.conn.lock().execute(
            "INSERT INTO world_info (name, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![name, json, now, checksum],
        )?;

        debug!(
            document = name,
            entries = document.len(),
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved World Info document"
        );
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM world_info WHERE name = ?1", params![name])?;
        Ok(deleted > 0)
    }

    fn list(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT name FROM world_info ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }
}
