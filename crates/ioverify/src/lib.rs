//! # ioverify
//!
//! Data-integrity verification for storage I/O: stamp outgoing write
//! payloads with a self-describing checksum header, remember every completed
//! write, and confirm on read-back that storage returned what was written.
//!
//! ## Overview
//!
//! - **Seal**: fill a write buffer with seeded pseudo-random bytes and a
//!   header carrying the digest of those bytes
//! - **History**: every completed write becomes an entry that a later
//!   verification read consumes exactly once
//! - **Verify**: re-read a history entry and check its header and digest
//!
//! Each worker owns a [`ThreadVerifyState`] (generator, algorithm, history);
//! nothing is shared between workers except the storage backend.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ioverify::{Job, VerifyConfig};
//! use ioverify::store::MemoryBackend;
//!
//! async fn example() {
//!     let config = VerifyConfig::from_json_str(r#"{"algorithm": "md5", "blocks": 16}"#).unwrap();
//!     let backend = Arc::new(MemoryBackend::new());
//!     let file = backend.add_file("scratch", config.file_size()).unwrap();
//!
//!     let report = Job::new(config, backend).unwrap().run(&[file]).await.unwrap();
//!     assert!(report.is_clean());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `ioverify::core` - Checksums, header codec, write history
//! - `ioverify::store` - Storage backends

pub mod config;
pub mod engine;
pub mod error;
pub mod job;
pub mod logging;
pub mod state;

// Re-export component crates
pub use ioverify_core as core;
pub use ioverify_store as store;

// Re-export main types for convenience
pub use config::{IoPattern, VerifyConfig};
pub use engine::{PassPlan, Schedule, Verification, Verifier, VerifyFailure, WorkerReport};
pub use error::{EngineError, Result};
pub use job::{Job, JobReport};
pub use state::ThreadVerifyState;

// Re-export commonly used core types
pub use ioverify_core::{
    ChecksumAdapter, ChecksumAlgorithm, Checksums, CorruptionError, Digest, FileId, HistoryEntry,
    IoBuffer, IoDirection, HEADER_SIZE,
};
