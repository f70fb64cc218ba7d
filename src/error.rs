// Error taxonomy for the dashboard pipeline
//
// Two families:
// 1. StoreError  - a fetch against the record store failed (RetrievalFailure)
// 2. ShapeError  - a field was present but could not be coerced (DataShapeFailure)
//
// Neither is fatal: the fetcher downgrades StoreError to an empty sequence and
// the parse boundary turns ShapeError into a safe default plus a ShapeIssue.

use thiserror::Error;

use crate::store::Collection;

/// A retrieval against the record store failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("query timed out after {0} ms")]
    Timeout(u64),

    #[error("store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("store connection lock poisoned")]
    Poisoned,
}

/// A single field failed its expected-type coercion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("field is missing")]
    Missing,

    #[error("value {0:?} is not numeric")]
    NotNumeric(String),

    #[error("value {0} is not a finite number")]
    NotFinite(String),

    #[error("value {0:?} is not a valid timestamp")]
    InvalidTimestamp(String),

    #[error("value {0:?} is not a valid date")]
    InvalidDate(String),

    #[error("embedded JSON could not be parsed: {0}")]
    InvalidJson(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
}

/// Where a ShapeError happened, so it can be logged and reported.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeIssue {
    pub collection: Collection,
    pub record_id: String,
    pub field: &'static str,
    pub error: ShapeError,
}

impl std::fmt::Display for ShapeIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}].{}: {}",
            self.collection.table_name(),
            self.record_id,
            self.field,
            self.error
        )
    }
}

/// Configuration could not be loaded or failed validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}
