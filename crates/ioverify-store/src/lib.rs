//! # ioverify Store
//!
//! The storage I/O layer that verified buffers travel through. Provides a
//! trait-based interface with in-memory and file-backed implementations.
//!
//! ## Overview
//!
//! The verification engine never touches a device directly. It asks an
//! [`IoBackend`] to open objects, submit transfers, and track references.
//! The primary implementation is [`FileBackend`], with [`MemoryBackend`] for
//! testing and fault injection.
//!
//! ## Key Types
//!
//! - [`IoBackend`] - The async trait for all storage operations
//! - [`FileBackend`] - Regular files on disk
//! - [`MemoryBackend`] - Fixed-size in-memory objects
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ioverify_core::IoBuffer;
//! use ioverify_store::{IoBackend, MemoryBackend};
//!
//! async fn example() {
//!     let backend = MemoryBackend::new();
//!     let file = backend.add_file("scratch", 1 << 20).unwrap();
//!     backend.open(file).await.unwrap();
//!
//!     let mut buf = IoBuffer::new(4096);
//!     buf.file = Some(file);
//!     let written = backend.submit(&mut buf).await.unwrap();
//!     assert_eq!(written, 4096);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Reference counting**: `retain`/`release` pin an object while a unit
//!   that names it is in flight
//! - **Positional I/O**: every transfer carries its own offset; there is no
//!   shared cursor

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use traits::IoBackend;
