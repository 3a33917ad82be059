pub mod iterator;
pub mod skiplist;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::comparator::Comparator;
use crate::error::{Error, Result};
use crate::options::Options;
use crate::types::Range;

pub use iterator::MemTableIterator;
use skiplist::SkipList;

/// In-memory sorted buffer for writes, backed by an arena skip list.
///
/// Every write lands here first. Once large enough, the caller freezes it
/// (stops writing to it), flushes it to a table and builds a fresh one, or
/// calls [`reset`](Self::reset) to reuse the arenas.
///
/// # Concurrency
///
/// Mutations take an exclusive lock for their whole call, so `put` and
/// `delete` are serialized. Reads take a shared lock for a single traversal.
/// Iterators take it per step, never for their lifetime, which means a
/// live iterator sees a moving target: writes that land while it walks may
/// or may not be observed, and no point-in-time snapshot is provided. Each
/// step is still consistent; a key always comes with its own value.
pub struct MemTable {
    list: RwLock<SkipList>,
    cmp: Arc<dyn Comparator>,
}

impl MemTable {
    /// Creates an empty table. `capacity` is the initial key/value arena
    /// size; advisory, not a limit.
    pub fn new(cmp: Arc<dyn Comparator>, capacity: usize) -> Self {
        MemTable {
            list: RwLock::new(SkipList::new(Arc::clone(&cmp), capacity)),
            cmp,
        }
    }

    pub fn with_options(opts: &Options) -> Self {
        Self::new(Arc::clone(&opts.comparator), opts.write_buffer)
    }

    /// Inserts or overwrites `key`.
    pub fn put(&self, key: &[u8], value: &[u8]) {
        self.list.write().insert(key, value);
    }

    /// Removes `key`. Returns [`Error::NotFound`] if absent.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.list.write().remove(key)
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.list.read().get(key).map(<[u8]>::to_vec).ok_or(Error::NotFound)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.list.read().contains(key)
    }

    /// Smallest entry whose key is >= `key`.
    pub fn find(&self, key: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        self.list
            .read()
            .find(key)
            .map(|(k, v)| (k.to_vec(), v.to_vec()))
            .ok_or(Error::NotFound)
    }

    /// Iterator over `[range.start, range.limit)`, or every key without a range.
    pub fn iter(&self, range: Option<Range>) -> MemTableIterator<'_> {
        MemTableIterator::new(self, range)
    }

    pub fn len(&self) -> usize {
        self.list.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.read().is_empty()
    }

    /// Sum of live key and value lengths. Removed entries still take arena
    /// space but are not counted.
    pub fn size(&self) -> usize {
        self.list.read().kv_size()
    }

    /// Key/value arena capacity.
    pub fn capacity(&self) -> usize {
        self.list.read().capacity()
    }

    /// Key/value arena bytes left before it has to grow.
    pub fn free(&self) -> usize {
        self.list.read().free()
    }

    /// Empties the table, keeping the arenas for reuse.
    ///
    /// Live iterators notice on their next step and continue from their
    /// last key in the (now fresh) table.
    pub fn reset(&self) {
        let mut list = self.list.write();
        debug!(entries = list.len(), kv_used = list.kv_used(), "resetting memtable");
        list.reset();
    }

    pub fn stats(&self) -> MemTableStats {
        let list = self.list.read();
        MemTableStats {
            kv_bytes: list.kv_used(),
            record_bytes: list.record_bytes(),
            entries: list.len(),
            live_bytes: list.kv_size(),
            height: list.height(),
        }
    }

    pub fn comparator(&self) -> &Arc<dyn Comparator> {
        &self.cmp
    }

    pub(crate) fn list(&self) -> &RwLock<SkipList> {
        &self.list
    }
}

/// Point-in-time memory figures for a [`MemTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemTableStats {
    /// Bytes appended to the key/value arena, including abandoned ones.
    pub kv_bytes: usize,
    /// Bytes taken by record headers and links.
    pub record_bytes: usize,
    pub entries: usize,
    /// Live key + value bytes.
    pub live_bytes: usize,
    /// Levels in use.
    pub height: usize,
}

impl fmt::Display for MemTableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ratio = if self.record_bytes == 0 {
            0.0
        } else {
            self.kv_bytes as f64 / self.record_bytes as f64
        };
        let avg = if self.entries == 0 {
            0.0
        } else {
            self.live_bytes as f64 / self.entries as f64
        };
        writeln!(f, "keyvalue size: {}", self.kv_bytes)?;
        writeln!(f, "metadata size: {}", self.record_bytes)?;
        writeln!(f, "item count: {}", self.entries)?;
        writeln!(f, "data/metadata ratio: {ratio:.02}")?;
        writeln!(f, "average kv item size: {avg:.02}")
    }
}
