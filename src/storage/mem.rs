use std::collections::HashMap;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::{FileDesc, FileType, Storage, StorageLock, StorageReader, StorageWriter};

#[derive(Default)]
struct MemFile {
    data: Vec<u8>,
    open: bool,
}

#[derive(Default)]
struct Inner {
    files: HashMap<FileDesc, MemFile>,
    meta: Option<FileDesc>,
    locked: bool,
    closed: bool,
}

impl Inner {
    fn check_open(&self) -> Result<()> {
        if self.closed { Err(Error::Closed) } else { Ok(()) }
    }

    fn release(&mut self, fd: FileDesc) {
        if let Some(file) = self.files.get_mut(&fd) {
            file.open = false;
        }
    }
}

/// In-memory [`Storage`].
///
/// A file is exclusive while a reader or writer holds it: opening,
/// creating, renaming or removing it again fails with `FileAlreadyOpen`
/// until the handle is dropped. Cloning shares the same files.
#[derive(Clone, Default)]
pub struct MemStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes across all files.
    pub fn total_size(&self) -> usize {
        self.inner.lock().files.values().map(|f| f.data.len()).sum()
    }

    /// Size of one file.
    pub fn file_size(&self, fd: FileDesc) -> Result<u64> {
        let inner = self.inner.lock();
        inner.check_open()?;
        inner
            .files
            .get(&fd)
            .map(|f| f.data.len() as u64)
            .ok_or(Error::FileNotExist(fd))
    }
}

impl Storage for MemStorage {
    fn lock(&self) -> Result<Box<dyn StorageLock>> {
        let mut inner = self.inner.lock();
        inner.check_open()?;
        if inner.locked {
            return Err(Error::Locked);
        }
        inner.locked = true;
        Ok(Box::new(MemLock {
            inner: Arc::clone(&self.inner),
            held: true,
        }))
    }

    fn set_meta(&self, fd: FileDesc) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_open()?;
        if fd.file_type != FileType::Manifest {
            return Err(Error::InvalidFile);
        }
        if !inner.files.contains_key(&fd) {
            return Err(Error::FileNotExist(fd));
        }
        debug!(%fd, "set manifest pointer");
        inner.meta = Some(fd);
        Ok(())
    }

    fn get_meta(&self) -> Result<FileDesc> {
        let inner = self.inner.lock();
        inner.check_open()?;
        inner.meta.ok_or(Error::NotFound)
    }

    fn list(&self, types: &[FileType]) -> Result<Vec<FileDesc>> {
        let inner = self.inner.lock();
        inner.check_open()?;
        let mut fds: Vec<FileDesc> = inner
            .files
            .keys()
            .filter(|fd| types.contains(&fd.file_type))
            .copied()
            .collect();
        fds.sort();
        Ok(fds)
    }

    fn open(&self, fd: FileDesc) -> Result<Box<dyn StorageReader>> {
        let mut inner = self.inner.lock();
        inner.check_open()?;
        debug!(%fd, "open file");
        let file = inner.files.get_mut(&fd).ok_or(Error::FileNotExist(fd))?;
        if file.open {
            return Err(Error::FileAlreadyOpen(fd));
        }
        file.open = true;
        Ok(Box::new(MemReader {
            inner: Arc::clone(&self.inner),
            fd,
            cursor: Cursor::new(file.data.clone()),
        }))
    }

    fn create(&self, fd: FileDesc) -> Result<Box<dyn StorageWriter>> {
        let mut inner = self.inner.lock();
        inner.check_open()?;
        debug!(%fd, "create file");
        let file = inner.files.entry(fd).or_default();
        if file.open {
            return Err(Error::FileAlreadyOpen(fd));
        }
        file.open = true;
        file.data.clear();
        Ok(Box::new(MemWriter {
            inner: Arc::clone(&self.inner),
            fd,
        }))
    }

    fn remove(&self, fd: FileDesc) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_open()?;
        debug!(%fd, "remove file");
        match inner.files.get(&fd) {
            None => return Err(Error::FileNotExist(fd)),
            Some(file) if file.open => return Err(Error::FileAlreadyOpen(fd)),
            Some(_) => {}
        }
        inner.files.remove(&fd);
        if inner.meta == Some(fd) {
            inner.meta = None;
        }
        Ok(())
    }

    fn rename(&self, old: FileDesc, new: FileDesc) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_open()?;
        debug!(from = %old, to = %new, "rename file");
        match inner.files.get(&old) {
            None => return Err(Error::FileNotExist(old)),
            Some(file) if file.open => return Err(Error::FileAlreadyOpen(old)),
            Some(_) => {}
        }
        if old == new {
            return Ok(());
        }
        if inner.files.get(&new).is_some_and(|f| f.open) {
            return Err(Error::FileAlreadyOpen(new));
        }
        if let Some(file) = inner.files.remove(&old) {
            inner.files.insert(new, file);
        }
        if inner.meta == Some(old) {
            inner.meta = Some(new);
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_open()?;
        inner.closed = true;
        Ok(())
    }
}

struct MemLock {
    inner: Arc<Mutex<Inner>>,
    held: bool,
}

impl StorageLock for MemLock {
    fn unlock(&mut self) {
        if self.held {
            self.held = false;
            self.inner.lock().locked = false;
        }
    }
}

impl Drop for MemLock {
    fn drop(&mut self) {
        self.unlock();
    }
}

/// Reads a copy of the file taken at open time.
struct MemReader {
    inner: Arc<Mutex<Inner>>,
    fd: FileDesc,
    cursor: Cursor<Vec<u8>>,
}

impl Read for MemReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MemReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl Drop for MemReader {
    fn drop(&mut self) {
        debug!(fd = %self.fd, "close reader");
        self.inner.lock().release(self.fd);
    }
}

/// Appends straight into the stored file.
struct MemWriter {
    inner: Arc<Mutex<Inner>>,
    fd: FileDesc,
}

impl Write for MemWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        let file = inner
            .files
            .get_mut(&self.fd)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{} vanished", self.fd)))?;
        file.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StorageWriter for MemWriter {
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Drop for MemWriter {
    fn drop(&mut self) {
        debug!(fd = %self.fd, "close writer");
        self.inner.lock().release(self.fd);
    }
}
