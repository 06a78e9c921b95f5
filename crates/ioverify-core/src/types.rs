//! Strong type definitions for verified I/O units.

use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CodecError;

/// Handle to a backing storage object owned by the I/O layer.
///
/// This is a non-owning reference: the I/O layer decides what the number
/// designates and when the object is opened or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    /// Create from a raw handle.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw handle.
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

impl From<u32> for FileId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoDirection {
    Write,
    Read,
}

/// Where a buffer is in its verification lifecycle.
///
/// Write path: `Fresh -> Sealed`. Read path:
/// `Pending -> ReadBack -> Verified | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferState {
    /// Allocated, not yet filled.
    Fresh,
    /// Sealed and written; its history entry is recorded.
    Sealed,
    /// Bound to a history entry, waiting for the read to be issued.
    Pending,
    /// Filled with bytes read from storage.
    ReadBack,
    /// Read-back bytes matched their header.
    Verified,
    /// Read-back bytes did not match their header.
    Failed,
}

/// A verified transfer unit.
///
/// Allocated by the I/O layer, sealed before a write, read into before a
/// verification, and returned to the pool with [`IoBuffer::reset`].
/// The logical length never exceeds the capacity; it only changes through
/// [`IoBuffer::set_length`], [`IoBuffer::bind`] and [`IoBuffer::reset`].
#[derive(Debug, Clone)]
pub struct IoBuffer {
    bytes: BytesMut,
    length: usize,
    /// Target offset in the backing object.
    pub offset: u64,
    /// Transfer direction.
    pub direction: IoDirection,
    /// Backing object, when bound.
    pub file: Option<FileId>,
    /// Lifecycle state.
    pub state: BufferState,
}

impl IoBuffer {
    /// Allocate a zeroed buffer of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: BytesMut::zeroed(capacity),
            length: capacity,
            offset: 0,
            direction: IoDirection::Write,
            file: None,
            state: BufferState::Fresh,
        }
    }

    /// Allocated size.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Logical length of the unit.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Set the logical length of the unit.
    pub fn set_length(&mut self, length: usize) -> Result<(), CodecError> {
        if length > self.capacity() {
            return Err(CodecError::LengthExceedsCapacity {
                length,
                capacity: self.capacity(),
            });
        }
        self.length = length;
        Ok(())
    }

    /// The bytes in use.
    pub fn data(&self) -> &[u8] {
        &self.bytes[..self.length]
    }

    /// The bytes in use, mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.length]
    }

    /// Whether a file and offset are bound.
    pub fn is_bound(&self) -> bool {
        self.file.is_some()
    }

    /// Whether this buffer holds a verification read that has not been
    /// checked yet. Re-scheduling such a buffer is a requeue.
    pub fn is_read_pending(&self) -> bool {
        self.is_bound()
            && self.direction == IoDirection::Read
            && matches!(self.state, BufferState::Pending | BufferState::ReadBack)
    }

    /// Bind this buffer to a history entry for a verification read.
    ///
    /// Fails without changing the buffer if the entry is longer than the
    /// capacity.
    pub fn bind(&mut self, entry: &HistoryEntry) -> Result<(), CodecError> {
        self.set_length(entry.length)?;
        self.offset = entry.offset;
        self.file = Some(entry.file);
        self.direction = IoDirection::Read;
        Ok(())
    }

    /// Return to the pool: unbind and mark fresh. Contents are left as-is.
    pub fn reset(&mut self) {
        self.length = self.capacity();
        self.offset = 0;
        self.direction = IoDirection::Write;
        self.file = None;
        self.state = BufferState::Fresh;
    }
}

/// Descriptor of a completed write awaiting its verification read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Offset the payload was written at.
    pub offset: u64,
    /// Length of the payload.
    pub length: usize,
    /// Object the payload was written to.
    pub file: FileId,
}

impl HistoryEntry {
    /// Create a new entry.
    pub const fn new(offset: u64, length: usize, file: FileId) -> Self {
        Self {
            offset,
            length,
            file,
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.file, self.offset, self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_bind_and_reset() {
        let mut buf = IoBuffer::new(4096);
        assert_eq!(buf.state, BufferState::Fresh);
        assert!(!buf.is_bound());

        buf.bind(&HistoryEntry::new(8192, 1024, FileId(3))).unwrap();
        assert!(buf.is_bound());
        assert_eq!(buf.direction, IoDirection::Read);
        assert_eq!(buf.data().len(), 1024);
        assert_eq!(buf.capacity(), 4096);

        buf.reset();
        assert!(!buf.is_bound());
        assert_eq!(buf.length(), 4096);
        assert_eq!(buf.state, BufferState::Fresh);
    }

    #[test]
    fn test_sealed_write_is_not_a_pending_read() {
        let mut buf = IoBuffer::new(4096);
        buf.file = Some(FileId(1));
        buf.state = BufferState::Sealed;
        assert!(buf.is_bound());
        assert!(!buf.is_read_pending());

        buf.bind(&HistoryEntry::new(0, 4096, FileId(1))).unwrap();
        buf.state = BufferState::Pending;
        assert!(buf.is_read_pending());
        buf.state = BufferState::ReadBack;
        assert!(buf.is_read_pending());
        buf.state = BufferState::Verified;
        assert!(!buf.is_read_pending());
    }

    #[test]
    fn test_length_cannot_exceed_capacity() {
        let mut buf = IoBuffer::new(512);
        assert_eq!(
            buf.set_length(513),
            Err(CodecError::LengthExceedsCapacity {
                length: 513,
                capacity: 512
            })
        );
        assert_eq!(buf.data().len(), 512);

        let oversized = HistoryEntry::new(0, 1024, FileId(7));
        assert!(buf.bind(&oversized).is_err());
        assert!(!buf.is_bound());
        assert_eq!(buf.length(), 512);

        buf.set_length(100).unwrap();
        assert_eq!(buf.data_mut().len(), 100);
    }

    #[test]
    fn test_file_id_raw() {
        let id = FileId::new(9);
        assert_eq!(id.raw(), 9);
        assert_eq!(FileId::from(9u32), id);
        assert_eq!(id.to_string(), "file#9");
    }

    #[test]
    fn test_history_entry_display() {
        let entry = HistoryEntry::new(4096, 512, FileId(1));
        assert_eq!(entry.to_string(), "file#1@4096/512");
    }
}
