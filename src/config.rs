// Configuration - TOML file with CLI overrides applied by the binary

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::{JsonFileStore, LedgerStore, MemoryStore, SqliteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Json,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "json" => Ok(StorageBackend::Json),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Where the ledger lives
    pub storage: StorageBackend,

    /// Database or JSON file path, depending on `storage`
    pub data_path: PathBuf,

    /// Directory that receives exported reports
    pub export_dir: PathBuf,

    /// Log filter, e.g. "info" or "payment_tracker=debug". RUST_LOG wins.
    pub log_level: String,

    /// Log file used while the terminal UI owns the screen
    pub log_file: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            storage: StorageBackend::Sqlite,
            data_path: PathBuf::from("payment-tracker.db"),
            export_dir: PathBuf::from("."),
            log_level: "warn".to_string(),
            log_file: None,
        }
    }
}

impl TrackerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    /// Load from file; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(TrackerConfig::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration file: {:?}", path))
    }

    pub fn open_store(&self) -> Result<Box<dyn LedgerStore>> {
        let store: Box<dyn LedgerStore> = match self.storage {
            StorageBackend::Sqlite => Box::new(
                SqliteStore::open(&self.data_path)
                    .with_context(|| format!("Failed to open database: {:?}", self.data_path))?,
            ),
            StorageBackend::Json => Box::new(JsonFileStore::new(&self.data_path)),
            StorageBackend::Memory => Box::new(MemoryStore::new()),
        };
        Ok(store)
    }
}
