//! Pipeline-level errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while running the import pipeline.
///
/// Only the variants raised outside the per-record boundary (input loading,
/// taxonomy bootstrap, error-log setup) are fatal to a batch; record-level
/// occurrences are caught by the driver, logged and counted.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Error from the persistent store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The input file could not be read.
    #[error("failed to read input file {path}: {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input file is not a valid dataset document.
    #[error("failed to parse input file {path}: {source}")]
    InputParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The error log file could not be created or truncated.
    #[error("failed to initialize error log {path}: {source}")]
    LogInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store has no fallback taxonomy row the pipeline relies on.
    ///
    /// Bootstrap guarantees at least one category, subcategory and design
    /// exist, so this indicates the store was modified mid-batch.
    #[error("no fallback {0} available in the store")]
    MissingFallback(&'static str),
}
