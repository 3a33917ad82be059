use std::io;

use thiserror::Error;

use crate::storage::FileDesc;

/// Unified error type for the storage core.
#[derive(Debug, Error)]
pub enum Error {
    /// Key not found. Expected control flow for lookups and deletes.
    #[error("not found")]
    NotFound,

    /// A positioning call was made on an iterator after `release()`.
    #[error("iterator released")]
    IteratorReleased,

    /// The file descriptor is not valid for the operation, such as a
    /// manifest pointer naming a non-manifest file.
    #[error("invalid file")]
    InvalidFile,

    /// The file does not exist in the storage.
    #[error("file does not exist: {0}")]
    FileNotExist(FileDesc),

    /// The file is already opened by another reader or writer.
    #[error("file already open: {0}")]
    FileAlreadyOpen(FileDesc),

    /// The storage lock is held by someone else.
    #[error("storage locked")]
    Locked,

    /// The storage has been closed.
    #[error("storage closed")]
    Closed,

    /// Caller passed something the operation cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Data corruption detected (checksum mismatch, bad format, broken ordering).
    #[error("corruption: {0}")]
    Corruption(String),

    /// IO error from the underlying byte stream.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }

    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
