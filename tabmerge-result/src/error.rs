use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type for all tabmerge operations.
///
/// Each stage of the pipeline reports failures through one of these variants. None of them is
/// recovered locally: the caller receives the first error and the run stops there.
///
/// `Error` implements `Send` and `Sync`.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error outside of source loading (for example while writing generated data).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Arrow error during columnar operations (casts, gathers, batch assembly).
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A required input could not be turned into a table.
    ///
    /// Raised by the load stage when the file is missing or unreadable, when its content is
    /// malformed, or when a required column is absent or cannot be cast to its canonical type.
    #[error("failed to read {table} source {path:?}: {reason}")]
    SourceRead {
        /// Logical name of the source (`orders`, `products`, `customers`).
        table: String,
        /// Path that was being read.
        path: PathBuf,
        /// Human-readable description of the failure.
        reason: String,
    },

    /// A join key that must be unique on the build side appears more than once.
    ///
    /// Accepting the duplicate would inflate the joined row count, so strict joins fail fast.
    #[error("join key {column}={key} is not unique in {table}")]
    JoinKey {
        /// Name of the build-side table.
        table: String,
        /// Key column on the build side.
        column: String,
        /// Rendered duplicated key value.
        key: String,
    },

    /// A value does not fit the narrower type selected for its column.
    #[error("value {value} at row {row} of column '{column}' does not fit {target}")]
    NarrowingOverflow {
        column: String,
        /// Target Arrow type, rendered.
        target: String,
        /// Offending value, rendered.
        value: String,
        row: usize,
    },

    /// Invalid caller input or configuration.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Internal error indicating a bug or a violated invariant.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Build an [`Error::SourceRead`] from any displayable cause.
    ///
    /// ```
    /// use tabmerge_result::Error;
    ///
    /// let err = Error::source_read("orders", "data/orders.csv", "missing column 'Quantity'");
    /// assert!(err.to_string().contains("missing column 'Quantity'"));
    /// ```
    pub fn source_read<E: fmt::Display>(
        table: impl Into<String>,
        path: impl AsRef<Path>,
        reason: E,
    ) -> Self {
        Error::SourceRead {
            table: table.into(),
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Build an [`Error::NarrowingOverflow`].
    pub fn narrowing_overflow(
        column: impl Into<String>,
        target: impl fmt::Display,
        value: impl fmt::Display,
        row: usize,
    ) -> Self {
        Error::NarrowingOverflow {
            column: column.into(),
            target: target.to_string(),
            value: value.to_string(),
            row,
        }
    }

    /// Returns true for errors raised while reading an input source.
    pub fn is_source_read(&self) -> bool {
        matches!(self, Error::SourceRead { .. })
    }
}
