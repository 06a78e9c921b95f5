//! IoBackend trait: the abstract interface to the storage I/O layer.
//!
//! The engine is backend-agnostic. Implementations include regular files
//! (primary) and in-memory objects (for tests).

use async_trait::async_trait;
use ioverify_core::{FileId, IoBuffer};

use crate::error::Result;

/// The IoBackend trait: async interface for storage I/O.
///
/// # Design Notes
///
/// - **Direction**: `submit` writes `buf.data()` for [`IoDirection::Write`]
///   and fills it for [`IoDirection::Read`].
/// - **Short transfers**: `submit` reports what it moved; the caller decides
///   whether a short count is an error.
/// - **References**: `retain` and `release` count in-flight users of an
///   object. They do not open or close it.
///
/// [`IoDirection::Write`]: ioverify_core::IoDirection::Write
/// [`IoDirection::Read`]: ioverify_core::IoDirection::Read
#[async_trait]
pub trait IoBackend: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Object Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Open an object. Opening an already open object is a no-op.
    async fn open(&self, file: FileId) -> Result<()>;

    /// Whether an object is currently open. Unknown handles are not open.
    async fn is_open(&self, file: FileId) -> bool;

    /// Close an object.
    async fn close(&self, file: FileId) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Reference Counting
    // ─────────────────────────────────────────────────────────────────────────

    /// Take a reference. Returns the new count.
    async fn retain(&self, file: FileId) -> Result<u32>;

    /// Drop a reference. Returns the new count, saturating at zero.
    async fn release(&self, file: FileId) -> Result<u32>;

    // ─────────────────────────────────────────────────────────────────────────
    // Transfers
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute the transfer described by `buf`.
    ///
    /// # Returns
    /// The number of bytes transferred.
    async fn submit(&self, buf: &mut IoBuffer) -> Result<usize>;
}
