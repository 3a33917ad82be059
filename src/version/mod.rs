//! # Versions
//!
//! A [`Version`] is an immutable snapshot of every on-disk table, grouped in
//! levels. It is never changed after it is built: the next version comes
//! from [`VersionStaging`], which applies [`VersionEdit`]s on top of a base.
//!
//! Versions are shared through `Arc`. Readers keep the version they started
//! with for as long as they read, so a writer installing a new version never
//! waits for them, and a table stays on disk until the last version listing
//! it is gone (see [`VersionSet::collect_obsolete`]).

pub mod edit;
pub mod level;
pub mod set;
pub mod staging;

use std::fmt;
use std::sync::Arc;

use crate::comparator::Comparator;
use crate::error::Result;
use crate::iterator::{EmptyIterator, MergeIterator, StorageIterator};
use crate::types::Range;

pub use edit::VersionEdit;
pub use level::Level;
pub use set::VersionSet;
pub use staging::VersionStaging;

/// Handle on one on-disk table. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFile {
    pub num: u64,
    /// File size in bytes.
    pub size: u64,
    pub min_key: Vec<u8>,
    pub max_key: Vec<u8>,
}

impl TableFile {
    pub fn new(num: u64, size: u64, min_key: impl Into<Vec<u8>>, max_key: impl Into<Vec<u8>>) -> Self {
        TableFile {
            num,
            size,
            min_key: min_key.into(),
            max_key: max_key.into(),
        }
    }

    /// Whether `[min_key, max_key]` intersects `[min, max]`, both inclusive.
    /// A missing bound is unbounded on that side.
    pub fn overlaps(&self, cmp: &dyn Comparator, min: Option<&[u8]>, max: Option<&[u8]>) -> bool {
        min.is_none_or(|min| cmp.compare(&self.max_key, min).is_ge())
            && max.is_none_or(|max| cmp.compare(&self.min_key, max).is_le())
    }

    /// Whether the table may hold keys in the half-open `range`.
    pub fn intersects(&self, cmp: &dyn Comparator, range: &Range) -> bool {
        range.start.as_ref().is_none_or(|s| cmp.compare(&self.max_key, s).is_ge())
            && range.limit.as_ref().is_none_or(|l| cmp.compare(&self.min_key, l).is_lt())
    }
}

/// Opens iterators over on-disk tables.
pub trait TableOpener: Send + Sync {
    fn table_iter(&self, table: &TableFile, range: Option<&Range>) -> Result<Box<dyn StorageIterator>>;
}

/// Immutable snapshot of the level structure.
pub struct Version {
    cmp: Arc<dyn Comparator>,
    levels: Vec<Level>,
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Version")
            .field("comparator", &self.cmp.name())
            .field("levels", &self.levels)
            .finish()
    }
}

impl Version {
    /// A version with no levels.
    pub fn new(cmp: Arc<dyn Comparator>) -> Self {
        Self::from_levels(cmp, Vec::new())
    }

    pub(crate) fn from_levels(cmp: Arc<dyn Comparator>, levels: Vec<Level>) -> Self {
        Version { cmp, levels }
    }

    pub fn comparator(&self) -> &Arc<dyn Comparator> {
        &self.cmp
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Tables of `level` in level order. Empty past the last level.
    pub fn level(&self, level: usize) -> &[Arc<TableFile>] {
        self.levels.get(level).map(Level::tables).unwrap_or(&[])
    }

    pub fn num_files(&self, level: usize) -> usize {
        self.level(level).len()
    }

    /// Bytes held by `level`.
    pub fn level_size(&self, level: usize) -> u64 {
        self.levels.get(level).map_or(0, Level::size)
    }

    pub fn total_files(&self) -> usize {
        self.levels.iter().map(Level::len).sum()
    }

    pub(crate) fn all_tables(&self) -> impl Iterator<Item = &Arc<TableFile>> {
        self.levels.iter().flat_map(Level::tables)
    }

    /// Tables of `level` whose range intersects `[min, max]`.
    ///
    /// On level 0 the result is newest first. On deeper levels it is in key
    /// order, and empty when `max < min`.
    pub fn get_overlaps(&self, level: usize, min: Option<&[u8]>, max: Option<&[u8]>) -> Vec<Arc<TableFile>> {
        let Some(tables) = self.levels.get(level) else {
            return Vec::new();
        };
        if level == 0 {
            tables.overlaps_unsorted(self.cmp.as_ref(), min, max)
        } else {
            tables.overlaps_sorted(self.cmp.as_ref(), min, max)
        }
    }

    /// Starts building the next version on top of this one.
    pub fn new_staging(self: &Arc<Self>) -> VersionStaging {
        VersionStaging::new(Arc::clone(self))
    }

    /// One iterator per table that may hold keys in `range`: level 0 newest
    /// first, then each deeper level in key order.
    ///
    /// A table that fails to open is represented by an empty iterator
    /// carrying the error.
    pub fn iterators(&self, opener: &dyn TableOpener, range: Option<&Range>) -> Vec<Box<dyn StorageIterator>> {
        let cmp = self.cmp.as_ref();
        let mut iters = Vec::new();
        for (index, level) in self.levels.iter().enumerate() {
            let tables: Box<dyn Iterator<Item = &Arc<TableFile>>> = if index == 0 {
                Box::new(level.tables().iter().rev())
            } else {
                Box::new(level.tables().iter())
            };
            for table in tables {
                if range.is_some_and(|r| !table.intersects(cmp, r)) {
                    continue;
                }
                let iter = opener
                    .table_iter(table, range)
                    .unwrap_or_else(|err| Box::new(EmptyIterator::with_error(err)) as Box<dyn StorageIterator>);
                iters.push(iter);
            }
        }
        iters
    }

    /// Read fan-in over `head` followed by this version's tables.
    ///
    /// `head` comes first so it wins ties; pass memtable iterators there,
    /// newest first. The version stays alive until the merge is released.
    pub fn merge_iterator<'a>(
        self: &Arc<Self>,
        mut head: Vec<Box<dyn StorageIterator + 'a>>,
        opener: &dyn TableOpener,
        range: Option<&Range>,
        strict: bool,
    ) -> MergeIterator<'a> {
        head.extend(
            self.iterators(opener, range)
                .into_iter()
                .map(|it| it as Box<dyn StorageIterator + 'a>),
        );
        let mut merge = MergeIterator::new(head, Arc::clone(&self.cmp), strict);
        let version = Arc::clone(self);
        merge.set_release_hook(move || drop(version));
        merge
    }
}
