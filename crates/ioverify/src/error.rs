//! Error types for the verification engine.

use ioverify_core::{CodecError, ConfigError, CorruptionError, FileId, HistoryEntry, IoDirection};
use ioverify_store::StoreError;
use thiserror::Error;

/// Errors that can occur while sealing, scheduling, or verifying units.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid configuration. Fatal.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    /// Buffer could not be sealed.
    #[error("seal error: {0}")]
    Codec(#[from] CodecError),

    /// Storage I/O failure, passed through without interpretation.
    #[error("I/O error: {0}")]
    Io(#[from] StoreError),

    /// Read-back data does not match what was written.
    #[error("verify failed at {offset}/{length} on {file} (worker {worker}): {source}")]
    Corruption {
        worker: usize,
        file: FileId,
        offset: u64,
        length: usize,
        source: CorruptionError,
    },

    /// The backend moved fewer bytes than the unit holds.
    #[error("short {direction:?} on {file} at {offset}: {transferred} of {expected} bytes")]
    ShortTransfer {
        file: FileId,
        offset: u64,
        direction: IoDirection,
        expected: usize,
        transferred: usize,
    },

    /// A history entry is larger than the buffer offered for it.
    #[error("history entry {entry} does not fit a {capacity}-byte buffer")]
    BufferTooSmall {
        entry: HistoryEntry,
        capacity: usize,
    },

    /// Operation needs a buffer bound to a file.
    #[error("buffer is not bound to a file")]
    NotBound,

    /// A worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Worker(String),
}

impl EngineError {
    /// The corruption behind this error, if it is a verification failure.
    pub fn corruption(&self) -> Option<&CorruptionError> {
        match self {
            EngineError::Corruption { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether this is a per-unit verification failure rather than a fault.
    pub fn is_corruption(&self) -> bool {
        self.corruption().is_some()
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
