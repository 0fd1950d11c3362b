// Storage Adapter - whole-ledger persistence
// The full ledger is one serialized blob; every save rewrites all of it.

use crate::error::StorageError;
use crate::ledger::Ledger;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key under which the ledger blob is stored
pub const STORAGE_KEY: &str = "monthlyPaymentTracker";

/// Synchronous key-value persistence for the serialized ledger.
/// `save` returning `Ok` means the write is durable.
pub trait LedgerStore {
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&mut self, blob: &str) -> Result<(), StorageError>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn load(&self) -> Result<Option<String>, StorageError> {
        (**self).load()
    }

    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        (**self).save(blob)
    }
}

pub fn encode_ledger(ledger: &Ledger) -> Result<String, StorageError> {
    Ok(serde_json::to_string(ledger)?)
}

pub fn decode_ledger(blob: &str) -> Result<Ledger, serde_json::Error> {
    serde_json::from_str(blob)
}

/// Load the ledger, falling back to an empty one when the blob is
/// missing or cannot be decoded. Only a failing backend is an error.
pub fn load_ledger<S: LedgerStore + ?Sized>(store: &S) -> Result<Ledger, StorageError> {
    match store.load()? {
        None => {
            debug!("no stored ledger found, starting empty");
            Ok(Ledger::new())
        }
        Some(blob) => match decode_ledger(&blob) {
            Ok(ledger) => Ok(ledger),
            Err(e) => {
                warn!(error = %e, "stored ledger could not be parsed, starting empty");
                Ok(Ledger::new())
            }
        },
    }
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
    key: String,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        setup_database(&conn)?;
        Ok(Self {
            conn,
            key: STORAGE_KEY.to_string(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

pub fn setup_database(conn: &Connection) -> Result<(), StorageError> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

impl LedgerStore for SqliteStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![self.key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![self.key, blob],
        )?;
        debug!(key = %self.key, bytes = blob.len(), "ledger saved to sqlite");
        Ok(())
    }
}

// ============================================================================
// JSON FILE STORE
// ============================================================================

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // Write-then-rename so a crash never leaves a half-written ledger
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = ?self.path, bytes = blob.len(), "ledger saved to file");
        Ok(())
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-process store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: Option<String>,
    fail_saves: bool,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
            ..Self::default()
        }
    }

    /// Make every following save fail
    pub fn set_fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.blob.clone())
    }

    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        if self.fail_saves {
            return Err(StorageError::Unavailable("memory store rejected write".to_string()));
        }
        self.saves += 1;
        self.blob = Some(blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::month::Month;

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.year_entry(2024).get_or_insert("Alice").toggle(Month::March);
        ledger.year_entry(2024).get_or_insert("Bob");
        ledger
    }

    #[test]
    fn test_sqlite_save_and_load() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load().unwrap().is_none());

        let ledger = sample_ledger();
        store.save(&encode_ledger(&ledger).unwrap()).unwrap();

        let loaded = load_ledger(&store).unwrap();
        assert_eq!(loaded, ledger);
    }

    #[test]
    fn test_sqlite_save_overwrites_single_row() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save("{}").unwrap();
        store.save(&encode_ledger(&sample_ledger()).unwrap()).unwrap();

        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(load_ledger(&store).unwrap(), sample_ledger());
    }

    #[test]
    fn test_sqlite_file_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tracker.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.save(&encode_ledger(&sample_ledger()).unwrap()).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(load_ledger(&store).unwrap(), sample_ledger());
    }

    #[test]
    fn test_json_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("ledger.json"));
        assert!(store.load().unwrap().is_none());

        store.save(&encode_ledger(&sample_ledger()).unwrap()).unwrap();
        assert_eq!(load_ledger(&store).unwrap(), sample_ledger());
        assert!(!dir.path().join("ledger.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_blob_loads_as_empty() {
        let store = MemoryStore::with_blob("{not json");
        let ledger = load_ledger(&store).unwrap();
        assert_eq!(ledger, Ledger::new());
    }

    #[test]
    fn test_memory_store_failure() {
        let mut store = MemoryStore::new();
        store.set_fail_saves(true);
        assert!(matches!(store.save("{}"), Err(StorageError::Unavailable(_))));
        assert_eq!(store.save_count(), 0);
        assert!(store.blob().is_none());
    }
}
