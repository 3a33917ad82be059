use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::comparator::Comparator;
use crate::error::Result;
use crate::iterator::StorageIterator;
use crate::options::Options;
use crate::sstable::reader::Table;
use crate::storage::{FileDesc, Storage};
use crate::types::Range;
use crate::util::hash;
use crate::version::{TableFile, TableOpener};

const SHARD_SEED: u32 = 0xbc9f1d34;

/// Opened tables keyed by file number.
///
/// Split into independently locked shards so lookups of different tables
/// rarely contend. A table is opened from storage on first use and kept
/// until [`evict`](Self::evict)ed.
pub struct TableCache {
    storage: Arc<dyn Storage>,
    cmp: Arc<dyn Comparator>,
    shards: Vec<Mutex<HashMap<u64, Arc<Table>>>>,
}

impl TableCache {
    pub fn new(storage: Arc<dyn Storage>, opts: &Options) -> Self {
        let shards = (0..opts.table_cache_shards.max(1)).map(|_| Mutex::new(HashMap::new())).collect();
        TableCache {
            storage,
            cmp: Arc::clone(&opts.comparator),
            shards,
        }
    }

    fn shard(&self, num: u64) -> &Mutex<HashMap<u64, Arc<Table>>> {
        let h = hash(&num.to_le_bytes(), SHARD_SEED) as usize;
        &self.shards[h % self.shards.len()]
    }

    /// The table numbered `num`, opening it if not cached.
    pub fn open(&self, num: u64) -> Result<Arc<Table>> {
        let mut shard = self.shard(num).lock();
        if let Some(table) = shard.get(&num) {
            return Ok(Arc::clone(table));
        }
        let reader = self.storage.open(FileDesc::table(num))?;
        let table = Arc::new(Table::open(reader, Arc::clone(&self.cmp))?);
        debug!(num, entries = table.len(), size = table.meta().file_size, "opened table");
        shard.insert(num, Arc::clone(&table));
        Ok(table)
    }

    /// Drops the cached table `num`. Iterators already open keep working.
    pub fn evict(&self, num: u64) {
        if self.shard(num).lock().remove(&num).is_some() {
            debug!(num, "evicted table");
        }
    }

    /// Tables currently cached.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TableOpener for TableCache {
    fn table_iter(&self, table: &TableFile, range: Option<&Range>) -> Result<Box<dyn StorageIterator>> {
        let opened = self.open(table.num)?;
        Ok(Box::new(opened.iter(range)))
    }
}
