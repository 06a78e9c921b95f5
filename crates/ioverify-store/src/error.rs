//! Error types for the store module.

use ioverify_core::FileId;
use thiserror::Error;

/// Errors that can occur during backend operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No object is registered under this handle.
    #[error("unknown file: {0}")]
    UnknownFile(FileId),

    /// The object exists but is not open.
    #[error("{0} is not open")]
    NotOpen(FileId),

    /// Opening the object failed.
    #[error("failed to open {file}: {reason}")]
    OpenFailed { file: FileId, reason: String },

    /// Transfer would run past the end of a fixed-size object.
    #[error("transfer {offset}/{length} outside {file} of size {size}")]
    OutOfRange {
        file: FileId,
        offset: u64,
        length: usize,
        size: u64,
    },

    /// Buffer has no file bound.
    #[error("buffer is not bound to a file")]
    Unbound,

    /// Blocking task failed to complete.
    #[error("I/O task failed: {0}")]
    Task(String),

    /// Internal lock was poisoned by a panicking holder.
    #[error("backend lock poisoned")]
    LockPoisoned,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
