// Monthly Payment Tracker - Core Library
// Ledger state, operations and projections, usable from the CLI, the TUI and tests

pub mod config;
pub mod error;
pub mod export;
pub mod ledger;
pub mod month;
pub mod prompt;
pub mod storage;
pub mod tracker;
pub mod view;

// Re-export commonly used types
pub use config::{StorageBackend, TrackerConfig};
pub use error::{StorageError, TrackerError, TrackerResult, ValidationError};
pub use export::{export_year, DirectoryExportSink, ExportSink, Report};
pub use ledger::{Ledger, PaymentStatus, PersonRecord, YearRecord, MAX_NAME_LEN};
pub use month::Month;
pub use prompt::{ScriptedPrompt, TerminalPrompt, UserPrompt};
pub use storage::{JsonFileStore, LedgerStore, MemoryStore, SqliteStore, STORAGE_KEY};
pub use tracker::{year_options, DeleteOutcome, Tracker};
pub use view::{build_grid, build_summary, GridBody, GridView, SummaryView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
