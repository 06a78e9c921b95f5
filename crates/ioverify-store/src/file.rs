//! File implementation of the IoBackend trait.
//!
//! This is the primary backend. Objects are regular files addressed with
//! positional reads and writes, wrapped in async via tokio::spawn_blocking.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use ioverify_core::{FileId, IoBuffer, IoDirection};

use crate::error::{Result, StoreError};
use crate::traits::IoBackend;

/// File-based backend.
///
/// Thread-safe via internal Mutex. Transfers run on the blocking pool so
/// they never stall the async runtime.
pub struct FileBackend {
    inner: Mutex<FileBackendInner>,
}

struct FileBackendInner {
    files: HashMap<FileId, DiskFile>,
    next_id: u32,
}

struct DiskFile {
    path: PathBuf,
    /// Length the file is extended to when opened.
    size: u64,
    handle: Option<Arc<File>>,
    refs: u32,
}

impl FileBackend {
    /// Create a backend with no registered files.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(FileBackendInner {
                files: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    /// Register a file. It is created on first open and extended to `size`.
    pub fn register(&self, path: impl AsRef<Path>, size: u64) -> Result<FileId> {
        let mut inner = self.lock()?;
        let id = FileId(inner.next_id);
        inner.next_id += 1;
        inner.files.insert(
            id,
            DiskFile {
                path: path.as_ref().to_path_buf(),
                size,
                handle: None,
                refs: 0,
            },
        );
        Ok(id)
    }

    /// Path a file was registered with.
    pub fn path(&self, file: FileId) -> Result<PathBuf> {
        let inner = self.lock()?;
        Ok(inner.get(file)?.path.clone())
    }

    /// Current reference count.
    pub fn ref_count(&self, file: FileId) -> Result<u32> {
        let inner = self.lock()?;
        Ok(inner.get(file)?.refs)
    }

    fn lock(&self) -> Result<MutexGuard<'_, FileBackendInner>> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn handle(&self, file: FileId) -> Result<Arc<File>> {
        let inner = self.lock()?;
        inner
            .get(file)?
            .handle
            .clone()
            .ok_or(StoreError::NotOpen(file))
    }
}

impl Default for FileBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FileBackendInner {
    fn get(&self, file: FileId) -> Result<&DiskFile> {
        self.files.get(&file).ok_or(StoreError::UnknownFile(file))
    }

    fn get_mut(&mut self, file: FileId) -> Result<&mut DiskFile> {
        self.files.get_mut(&file).ok_or(StoreError::UnknownFile(file))
    }
}

/// Run a blocking closure on the blocking pool.
async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
        .map_err(StoreError::from)
}

#[async_trait]
impl IoBackend for FileBackend {
    async fn open(&self, file: FileId) -> Result<()> {
        let (path, size) = {
            let inner = self.lock()?;
            let disk = inner.get(file)?;
            if disk.handle.is_some() {
                return Ok(());
            }
            (disk.path.clone(), disk.size)
        };

        let shown = path.display().to_string();
        let handle = blocking(move || {
            let handle = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)?;
            if handle.metadata()?.len() < size {
                handle.set_len(size)?;
            }
            Ok(handle)
        })
        .await
        .map_err(|e| StoreError::OpenFailed {
            file,
            reason: e.to_string(),
        })?;

        tracing::debug!(%file, path = %shown, "opened file");
        let mut inner = self.lock()?;
        inner.get_mut(file)?.handle = Some(Arc::new(handle));
        Ok(())
    }

    async fn is_open(&self, file: FileId) -> bool {
        self.lock()
            .ok()
            .and_then(|inner| inner.files.get(&file).map(|disk| disk.handle.is_some()))
            .unwrap_or(false)
    }

    async fn close(&self, file: FileId) -> Result<()> {
        let mut inner = self.lock()?;
        inner.get_mut(file)?.handle = None;
        Ok(())
    }

    async fn retain(&self, file: FileId) -> Result<u32> {
        let mut inner = self.lock()?;
        let disk = inner.get_mut(file)?;
        disk.refs += 1;
        Ok(disk.refs)
    }

    async fn release(&self, file: FileId) -> Result<u32> {
        let mut inner = self.lock()?;
        let disk = inner.get_mut(file)?;
        disk.refs = disk.refs.saturating_sub(1);
        Ok(disk.refs)
    }

    async fn submit(&self, buf: &mut IoBuffer) -> Result<usize> {
        let file = buf.file.ok_or(StoreError::Unbound)?;
        let handle = self.handle(file)?;
        let offset = buf.offset;

        match buf.direction {
            IoDirection::Write => {
                let data = buf.data().to_vec();
                blocking(move || {
                    write_all_at(&handle, &data, offset)?;
                    Ok(data.len())
                })
                .await
            }
            IoDirection::Read => {
                let length = buf.length();
                let (data, moved) = blocking(move || {
                    let mut data = vec![0u8; length];
                    let moved = read_full_at(&handle, &mut data, offset)?;
                    Ok((data, moved))
                })
                .await?;
                buf.data_mut()[..moved].copy_from_slice(&data[..moved]);
                Ok(moved)
            }
        }
    }
}

#[cfg(unix)]
fn write_all_at(file: &File, data: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(data, offset)
}

#[cfg(unix)]
fn read_at(file: &File, data: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(data, offset)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut data: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !data.is_empty() {
        let n = file.seek_write(data, offset)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "failed to write whole buffer"));
        }
        data = &data[n..];
        offset += n as u64;
    }
    Ok(())
}

#[cfg(windows)]
fn read_at(file: &File, data: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(data, offset)
}

/// Read until `data` is full or EOF. Returns bytes read.
fn read_full_at(file: &File, data: &mut [u8], offset: u64) -> io::Result<usize> {
    let mut done = 0;
    while done < data.len() {
        match read_at(file, &mut data[done..], offset + done as u64) {
            Ok(0) => break,
            Ok(n) => done += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[tokio::test]
    async fn test_file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new();
        let path = dir.path().join("data.bin");
        let file = backend.register(&path, 16384).unwrap();
        assert_eq!(backend.path(file).unwrap(), path);
        assert!(!backend.is_open(file).await);
        backend.open(file).await.unwrap();
        assert!(backend.is_open(file).await);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 16384);

        let mut out = IoBuffer::new(4096);
        rand::thread_rng().fill_bytes(out.data_mut());
        out.file = Some(file);
        out.offset = 8192;
        assert_eq!(backend.submit(&mut out).await.unwrap(), 4096);

        let mut back = IoBuffer::new(4096);
        back.file = Some(file);
        back.offset = 8192;
        back.direction = IoDirection::Read;
        assert_eq!(backend.submit(&mut back).await.unwrap(), 4096);
        assert_eq!(back.data(), out.data());
    }

    #[tokio::test]
    async fn test_file_backend_short_read_at_eof() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new();
        let file = backend.register(dir.path().join("small.bin"), 1000).unwrap();
        backend.open(file).await.unwrap();

        let mut back = IoBuffer::new(512);
        back.file = Some(file);
        back.offset = 768;
        back.direction = IoDirection::Read;
        assert_eq!(backend.submit(&mut back).await.unwrap(), 232);
    }

    #[tokio::test]
    async fn test_file_backend_closed_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new();
        let file = backend.register(dir.path().join("c.bin"), 4096).unwrap();

        let mut buf = IoBuffer::new(512);
        buf.file = Some(file);
        assert!(matches!(
            backend.submit(&mut buf).await,
            Err(StoreError::NotOpen(_))
        ));

        backend.open(file).await.unwrap();
        backend.close(file).await.unwrap();
        assert!(!backend.is_open(file).await);

        assert!(matches!(
            backend.retain(FileId(42)).await,
            Err(StoreError::UnknownFile(_))
        ));
    }

    #[tokio::test]
    async fn test_file_backend_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new();
        let file = backend
            .register(dir.path().join("missing-dir").join("x.bin"), 4096)
            .unwrap();
        assert!(matches!(
            backend.open(file).await,
            Err(StoreError::OpenFailed { .. })
        ));
    }
}
