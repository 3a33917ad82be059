//! # LSM storage core
//!
//! The in-memory and metadata core of a Log-Structured Merge-Tree engine.
//!
//! ## Pieces
//! - [`memtable`]: arena-backed skip list taking every write first
//! - [`iterator`]: the positioning protocol all sorted sources share, plus
//!   the k-way [`MergeIterator`] that fans them into one stream
//! - [`version`]: immutable snapshots of the on-disk tables per level,
//!   overlap queries, and staging of the next snapshot
//! - [`sstable`] and [`storage`]: a flat table format and the file
//!   capability it is read from, enough to drive reads end to end
//!
//! ## Read path
//! A reader takes the current [`Version`], then merges the memtable
//! iterators with the iterators of every table the version lists for the
//! key range. Sources earlier in the merge win ties, so the freshest data
//! goes first.

pub mod comparator;
pub mod error;
pub mod iterator;
pub mod memtable;
pub mod options;
pub mod sstable;
pub mod storage;
pub mod types;
pub mod util;
pub mod version;

pub use comparator::{BytewiseComparator, Comparator, default_comparator};
pub use error::{Error, Result};
pub use iterator::{ArrayIterator, EmptyIterator, MergeIterator, StorageIterator};
pub use memtable::{MemTable, MemTableIterator, MemTableStats};
pub use options::Options;
pub use sstable::{Table, TableBuilder, TableCache, TableMeta};
pub use storage::{FileDesc, FileType, MemStorage, Storage};
pub use types::{Entry, Key, Range, Value};
pub use version::{TableFile, TableOpener, Version, VersionEdit, VersionSet, VersionStaging};
