//! Error types for ioverify core.

use thiserror::Error;

use crate::checksum::{ChecksumAlgorithm, Digest};

/// A read-back payload does not match what was written.
///
/// These are per-unit verification failures. They never abort a worker on
/// their own; the caller decides whether to continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorruptionError {
    #[error("bad verify header magic {found:08x}")]
    BadMagic { found: u32 },

    #[error("truncated payload: {len} bytes cannot hold a verify header")]
    Truncated { len: usize },

    #[error("header length {header} does not match buffer length {buffer}")]
    LengthMismatch { header: u32, buffer: usize },

    #[error("bad verify type {tag}")]
    UnknownAlgorithm { tag: u8 },

    #[error("verify type {found} does not match configured {expected}")]
    AlgorithmMismatch {
        expected: ChecksumAlgorithm,
        found: ChecksumAlgorithm,
    },

    #[error("{algorithm}: digest mismatch: wanted {}, got {}", expected.to_hex(), actual.to_hex())]
    DigestMismatch {
        algorithm: ChecksumAlgorithm,
        expected: Digest,
        actual: Digest,
    },
}

impl CorruptionError {
    /// Whether a digest was computed before this error was raised.
    pub fn is_digest_mismatch(&self) -> bool {
        matches!(self, CorruptionError::DigestMismatch { .. })
    }
}

/// A buffer cannot be sealed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("buffer of {len} bytes is smaller than the {min}-byte verify header")]
    BufferTooSmall { len: usize, min: usize },

    #[error("buffer of {len} bytes exceeds the maximum sealable length {max}")]
    BufferTooLarge { len: usize, max: usize },

    #[error("unit length {length} exceeds buffer capacity {capacity}")]
    LengthExceedsCapacity { length: usize, capacity: usize },
}

/// Invalid verification configuration. Fatal: a worker cannot start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown checksum algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("block size {block_size} is smaller than the {min}-byte verify header")]
    BlockTooSmall { block_size: usize, min: usize },

    #[error("at least one worker is required")]
    NoWorkers,

    #[error("{workers} workers need {workers} files, got {files}")]
    NotEnoughFiles { workers: usize, files: usize },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
