use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::Result;
use crate::options::Options;
use crate::version::edit::VersionEdit;
use crate::version::{TableFile, Version};

/// Owner of the current [`Version`].
///
/// Readers grab the current version with [`current`](Self::current) and
/// keep it for as long as they need, without holding any lock. Writers go
/// through [`apply`](Self::apply), one at a time.
pub struct VersionSet {
    current: RwLock<Arc<Version>>,
    next_file_number: AtomicU64,
    strict: bool,
    /// Tables dropped from a version, waiting for their last reader.
    /// Also serializes `apply`.
    removed: Mutex<Vec<Arc<TableFile>>>,
}

impl VersionSet {
    pub fn new(opts: &Options) -> Self {
        VersionSet {
            current: RwLock::new(Arc::new(Version::new(Arc::clone(&opts.comparator)))),
            next_file_number: AtomicU64::new(1),
            strict: opts.strict,
            removed: Mutex::new(Vec::new()),
        }
    }

    pub fn current(&self) -> Arc<Version> {
        Arc::clone(&self.current.read())
    }

    /// Allocates a fresh file number.
    pub fn new_file_number(&self) -> u64 {
        self.next_file_number.fetch_add(1, Ordering::Relaxed)
    }

    /// Makes sure `num` is never handed out again.
    pub fn mark_file_number_used(&self, num: u64) {
        self.next_file_number.fetch_max(num + 1, Ordering::Relaxed);
    }

    /// Builds the next version from the current one plus `edit` and installs
    /// it. On error the current version is left untouched.
    pub fn apply(&self, edit: &VersionEdit) -> Result<Arc<Version>> {
        let mut removed = self.removed.lock();
        let base = self.current();

        let mut staging = base.new_staging();
        staging.commit(edit);
        let next = staging.finish(self.strict)?;

        for (_, table) in edit.added_tables() {
            self.mark_file_number_used(table.num);
        }

        let live: HashSet<u64> = next.all_tables().map(|t| t.num).collect();
        removed.extend(base.all_tables().filter(|t| !live.contains(&t.num)).cloned());

        *self.current.write() = Arc::clone(&next);
        debug!(
            tables = next.total_files(),
            pending_removal = removed.len(),
            "installed version"
        );
        Ok(next)
    }

    /// Tables no longer in any live version, safe to delete from storage.
    ///
    /// A removed table stays pending while an older version that still lists
    /// it is held by a reader.
    pub fn collect_obsolete(&self) -> Vec<Arc<TableFile>> {
        let mut removed = self.removed.lock();
        let current = self.current();
        let live: HashSet<u64> = current.all_tables().map(|t| t.num).collect();

        let mut obsolete = Vec::new();
        removed.retain(|t| {
            if Arc::strong_count(t) > 1 {
                return true;
            }
            // A number that came back into the current version is not garbage.
            if !live.contains(&t.num) {
                obsolete.push(Arc::clone(t));
            }
            false
        });
        if !obsolete.is_empty() {
            debug!(count = obsolete.len(), "collected obsolete tables");
        }
        obsolete
    }
}
