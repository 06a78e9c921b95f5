//! In-memory implementation of the IoBackend trait.
//!
//! This is primarily for testing. Objects are fixed-size byte arrays with the
//! same open/reference semantics as files, plus hooks to corrupt data at rest
//! and to make opens fail.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use ioverify_core::{FileId, IoBuffer, IoDirection};

use crate::error::{Result, StoreError};
use crate::traits::IoBackend;

/// In-memory backend.
///
/// All data is lost when the backend is dropped. Thread-safe via RwLock.
pub struct MemoryBackend {
    inner: RwLock<MemoryBackendInner>,
}

struct MemoryBackendInner {
    /// Objects indexed by handle.
    files: HashMap<FileId, MemFile>,

    /// Next handle to hand out.
    next_id: u32,
}

struct MemFile {
    name: String,
    data: Vec<u8>,
    open: bool,
    refs: u32,
    /// When set, `open` fails with this reason.
    fail_open: Option<String>,
}

impl MemoryBackend {
    /// Create a new backend with no objects.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryBackendInner {
                files: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    /// Register a zero-filled object of `size` bytes. It starts closed.
    pub fn add_file(&self, name: impl Into<String>, size: u64) -> Result<FileId> {
        let size = usize::try_from(size).map_err(|_| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::OutOfMemory,
                "object size exceeds address space",
            ))
        })?;
        let mut inner = self.write()?;
        let id = FileId(inner.next_id);
        inner.next_id += 1;
        inner.files.insert(
            id,
            MemFile {
                name: name.into(),
                data: vec![0u8; size],
                open: false,
                refs: 0,
                fail_open: None,
            },
        );
        Ok(id)
    }

    /// Name an object was registered with.
    pub fn name(&self, file: FileId) -> Result<String> {
        let inner = self.read()?;
        Ok(inner.get(file)?.name.clone())
    }

    /// Snapshot of an object's bytes.
    pub fn contents(&self, file: FileId) -> Result<Vec<u8>> {
        let inner = self.read()?;
        Ok(inner.get(file)?.data.clone())
    }

    /// XOR `mask` into the byte at `offset`, simulating corruption at rest.
    pub fn corrupt(&self, file: FileId, offset: u64, mask: u8) -> Result<()> {
        let mut inner = self.write()?;
        let mem = inner.get_mut(file)?;
        let size = mem.data.len();
        match usize::try_from(offset) {
            Ok(at) if at < size => {
                mem.data[at] ^= mask;
                Ok(())
            }
            _ => Err(StoreError::OutOfRange {
                file,
                offset,
                length: 1,
                size: size as u64,
            }),
        }
    }

    /// Make every subsequent `open` of `file` fail until cleared with `None`.
    pub fn set_open_failure(&self, file: FileId, reason: Option<String>) -> Result<()> {
        let mut inner = self.write()?;
        inner.get_mut(file)?.fail_open = reason;
        Ok(())
    }

    /// Current reference count.
    pub fn ref_count(&self, file: FileId) -> Result<u32> {
        let inner = self.read()?;
        Ok(inner.get(file)?.refs)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryBackendInner>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryBackendInner>> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackendInner {
    fn get(&self, file: FileId) -> Result<&MemFile> {
        self.files.get(&file).ok_or(StoreError::UnknownFile(file))
    }

    fn get_mut(&mut self, file: FileId) -> Result<&mut MemFile> {
        self.files.get_mut(&file).ok_or(StoreError::UnknownFile(file))
    }
}

#[async_trait]
impl IoBackend for MemoryBackend {
    async fn open(&self, file: FileId) -> Result<()> {
        let mut inner = self.write()?;
        let mem = inner.get_mut(file)?;
        if let Some(reason) = &mem.fail_open {
            return Err(StoreError::OpenFailed {
                file,
                reason: reason.clone(),
            });
        }
        mem.open = true;
        Ok(())
    }

    async fn is_open(&self, file: FileId) -> bool {
        self.read()
            .ok()
            .and_then(|inner| inner.files.get(&file).map(|mem| mem.open))
            .unwrap_or(false)
    }

    async fn close(&self, file: FileId) -> Result<()> {
        let mut inner = self.write()?;
        inner.get_mut(file)?.open = false;
        Ok(())
    }

    async fn retain(&self, file: FileId) -> Result<u32> {
        let mut inner = self.write()?;
        let mem = inner.get_mut(file)?;
        mem.refs += 1;
        Ok(mem.refs)
    }

    async fn release(&self, file: FileId) -> Result<u32> {
        let mut inner = self.write()?;
        let mem = inner.get_mut(file)?;
        mem.refs = mem.refs.saturating_sub(1);
        Ok(mem.refs)
    }

    async fn submit(&self, buf: &mut IoBuffer) -> Result<usize> {
        let file = buf.file.ok_or(StoreError::Unbound)?;
        let mut inner = self.write()?;
        let mem = inner.get_mut(file)?;
        if !mem.open {
            return Err(StoreError::NotOpen(file));
        }

        let size = mem.data.len();
        let length = buf.length();
        let start = usize::try_from(buf.offset)
            .ok()
            .filter(|&start| start <= size)
            .ok_or(StoreError::OutOfRange {
                file,
                offset: buf.offset,
                length,
                size: size as u64,
            })?;

        match buf.direction {
            IoDirection::Write => {
                if start + length > size {
                    return Err(StoreError::OutOfRange {
                        file,
                        offset: buf.offset,
                        length,
                        size: size as u64,
                    });
                }
                mem.data[start..start + length].copy_from_slice(buf.data());
                Ok(length)
            }
            IoDirection::Read => {
                // Reads past the end are short, like a regular file at EOF.
                let end = (start + length).min(size);
                let moved = end - start;
                buf.data_mut()[..moved].copy_from_slice(&mem.data[start..end]);
                Ok(moved)
            }
        }
    }
}
