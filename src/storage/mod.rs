//! # Storage capability
//!
//! The core never touches the filesystem directly. Everything that needs
//! bytes on "disk" goes through [`Storage`]: numbered, typed files opened as
//! byte streams, plus a manifest pointer and a single-holder lock.
//!
//! [`MemStorage`] is the in-memory implementation used by tests and by
//! embedders that do not need durability.

pub mod mem;

use std::fmt;
use std::io::{Read, Seek, Write};

use crate::error::Result;

pub use mem::MemStorage;

/// What a stored file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileType {
    Manifest,
    Journal,
    Table,
    Temp,
}

impl FileType {
    pub const ALL: [FileType; 4] = [FileType::Manifest, FileType::Journal, FileType::Table, FileType::Temp];
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileType::Manifest => "manifest",
            FileType::Journal => "journal",
            FileType::Table => "table",
            FileType::Temp => "temp",
        };
        f.write_str(name)
    }
}

/// Identity of a stored file: its type and number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileDesc {
    pub file_type: FileType,
    pub num: u64,
}

impl FileDesc {
    pub fn new(file_type: FileType, num: u64) -> Self {
        FileDesc { file_type, num }
    }

    pub fn table(num: u64) -> Self {
        FileDesc::new(FileType::Table, num)
    }

    /// Parses a file name as produced by `Display`.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(num) = name.strip_prefix("MANIFEST-") {
            return num.parse().ok().map(|n| FileDesc::new(FileType::Manifest, n));
        }
        let (num, ext) = name.split_once('.')?;
        let num = num.parse().ok()?;
        let file_type = match ext {
            "log" => FileType::Journal,
            "ldb" | "sst" => FileType::Table,
            "tmp" => FileType::Temp,
            _ => return None,
        };
        Some(FileDesc::new(file_type, num))
    }
}

impl fmt::Display for FileDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file_type {
            FileType::Manifest => write!(f, "MANIFEST-{:06}", self.num),
            FileType::Journal => write!(f, "{:06}.log", self.num),
            FileType::Table => write!(f, "{:06}.ldb", self.num),
            FileType::Temp => write!(f, "{:06}.tmp", self.num),
        }
    }
}

/// Byte stream over a stored file. Dropping it closes the file.
pub trait StorageReader: Read + Seek + Send {}

impl<T: Read + Seek + Send> StorageReader for T {}

/// Writable byte stream over a stored file. Dropping it closes the file.
pub trait StorageWriter: Write + Send {
    /// Makes everything written so far durable.
    fn sync(&mut self) -> Result<()>;
}

impl<W: StorageWriter + ?Sized> StorageWriter for Box<W> {
    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }
}

/// Held storage lock. Released by `unlock` or on drop.
pub trait StorageLock: Send {
    fn unlock(&mut self);
}

/// Typed, numbered file store.
pub trait Storage: Send + Sync {
    /// Takes the single-holder lock. Fails with `Locked` while held elsewhere.
    fn lock(&self) -> Result<Box<dyn StorageLock>>;

    /// Points the manifest pointer at `fd`, an existing manifest file.
    /// Other file types are `InvalidFile`.
    fn set_meta(&self, fd: FileDesc) -> Result<()>;

    /// Current manifest pointer.
    fn get_meta(&self) -> Result<FileDesc>;

    /// Files whose type is one of `types`, ordered by type then number.
    fn list(&self, types: &[FileType]) -> Result<Vec<FileDesc>>;

    fn open(&self, fd: FileDesc) -> Result<Box<dyn StorageReader>>;

    /// Creates `fd`, truncating it if it exists.
    fn create(&self, fd: FileDesc) -> Result<Box<dyn StorageWriter>>;

    fn remove(&self, fd: FileDesc) -> Result<()>;

    /// Moves `old` to `new`, replacing `new` if it exists.
    fn rename(&self, old: FileDesc, new: FileDesc) -> Result<()>;

    fn close(&self) -> Result<()>;
}
