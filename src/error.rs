// Error taxonomy for the tracker core.
// Every variant is recoverable; Display strings are the user-facing notices.

use crate::ledger::MAX_NAME_LEN;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a person name.")]
    EmptyName,
    #[error("Person name is too long ({len} characters). Please keep it to {max} characters or fewer.", max = MAX_NAME_LEN)]
    NameTooLong { len: usize },
    #[error("\"{name}\" already exists for {year}.")]
    DuplicateName { name: String, year: i32 },
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode ledger: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Error saving data: {0}")]
    Storage(#[from] StorageError),
    #[error("No data available for year {year} to download.")]
    EmptyReport { year: i32 },
    #[error("export failed: {0}")]
    Export(String),
}

impl TrackerError {
    /// Validation failures leave the ledger untouched
    pub fn is_validation(&self) -> bool {
        matches!(self, TrackerError::Validation(_))
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
