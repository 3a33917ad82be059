use std::fmt;
use std::sync::Arc;

use crate::comparator::{Comparator, default_comparator};

/// Default initial capacity of the memtable key/value arena (4 MiB).
pub const DEFAULT_WRITE_BUFFER: usize = 4 * 1024 * 1024;

/// Default number of table cache shards.
pub const DEFAULT_TABLE_CACHE_SHARDS: usize = 16;

/// Tunables shared by the memtable, the version set and the table cache.
#[derive(Clone)]
pub struct Options {
    /// Key order used by every component built from these options.
    pub comparator: Arc<dyn Comparator>,
    /// Initial key/value arena capacity of a memtable. Advisory, not a limit.
    pub write_buffer: usize,
    /// Strict merge iterators latch every source error, and strict staging
    /// rejects overlapping tables on levels above 0.
    pub strict: bool,
    /// Number of independently locked table cache shards.
    pub table_cache_shards: usize,
}

impl Options {
    pub fn with_comparator(mut self, comparator: Arc<dyn Comparator>) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_write_buffer(mut self, write_buffer: usize) -> Self {
        self.write_buffer = write_buffer;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_table_cache_shards(mut self, shards: usize) -> Self {
        self.table_cache_shards = shards.max(1);
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            comparator: default_comparator(),
            write_buffer: DEFAULT_WRITE_BUFFER,
            strict: true,
            table_cache_shards: DEFAULT_TABLE_CACHE_SHARDS,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("comparator", &self.comparator.name())
            .field("write_buffer", &self.write_buffer)
            .field("strict", &self.strict)
            .field("table_cache_shards", &self.table_cache_shards)
            .finish()
    }
}
