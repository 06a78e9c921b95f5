//! # ioverify Core
//!
//! Pure primitives for data-integrity verification of storage I/O: checksum
//! algorithms, the self-describing verify header, and the write history that
//! pairs completed writes with later verification reads.
//!
//! This crate contains no I/O, no storage, no scheduling. It is pure
//! computation over byte buffers.
//!
//! ## Key Types
//!
//! - [`ChecksumAlgorithm`] - Closed set of supported digest algorithms
//! - [`ChecksumAdapter`] - Seam through which digests are filled and verified
//! - [`VerifyHeader`] - Fixed-size prefix stamped on every verified payload
//! - [`IoBuffer`] - A verified transfer unit
//! - [`WriteHistory`] - Pending writes awaiting a verification read
//!
//! ## Wire Format
//!
//! All header fields are little-endian. See [`header`] for the layout.

pub mod checksum;
pub mod codec;
pub mod error;
pub mod header;
pub mod history;
pub mod types;
pub mod verify;

pub use checksum::{fill, verify, ChecksumAdapter, ChecksumAlgorithm, Checksums, Digest, DIGEST_CAPACITY};
pub use codec::{inspect, seal, seal_with, Inspected};
pub use error::{CodecError, ConfigError, CorruptionError};
pub use header::{VerifyHeader, HEADER_MAGIC, HEADER_SIZE};
pub use history::{HistoryMode, WriteHistory};
pub use types::{BufferState, FileId, HistoryEntry, IoBuffer, IoDirection};
pub use verify::{verify_payload, verify_payload_as};
