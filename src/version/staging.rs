use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::version::edit::VersionEdit;
use crate::version::level::Level;
use crate::version::{TableFile, Version};

#[derive(Default)]
struct LevelDelta {
    added: HashMap<u64, Arc<TableFile>>,
    deleted: HashSet<u64>,
}

/// Mutable builder of the next [`Version`] on top of an immutable base.
///
/// Edits are accumulated with [`commit`](Self::commit) without touching the
/// base. [`finish`](Self::finish) materializes the new version.
pub struct VersionStaging {
    base: Arc<Version>,
    deltas: Vec<LevelDelta>,
}

impl VersionStaging {
    pub(crate) fn new(base: Arc<Version>) -> Self {
        VersionStaging {
            base,
            deltas: Vec::new(),
        }
    }

    pub fn base(&self) -> &Arc<Version> {
        &self.base
    }

    fn delta(&mut self, level: usize) -> &mut LevelDelta {
        if self.deltas.len() <= level {
            self.deltas.resize_with(level + 1, LevelDelta::default);
        }
        &mut self.deltas[level]
    }

    /// Records `edit`. Later commits win over earlier ones for the same
    /// level and table number.
    pub fn commit(&mut self, edit: &VersionEdit) {
        for &(level, num) in edit.deleted_tables() {
            let delta = self.delta(level);
            delta.added.remove(&num);
            delta.deleted.insert(num);
        }
        for (level, table) in edit.added_tables() {
            let delta = self.delta(*level);
            delta.deleted.remove(&table.num);
            delta.added.insert(table.num, Arc::new(table.clone()));
        }
    }

    /// Builds the new version.
    ///
    /// Base tables that were deleted or replaced are dropped, added tables
    /// are merged in, and each level is put back in level order. With
    /// `strict`, a level above 0 whose tables overlap is rejected with
    /// [`Error::Corruption`].
    pub fn finish(self, strict: bool) -> Result<Arc<Version>> {
        let cmp = Arc::clone(self.base.comparator());
        let num_levels = self.base.num_levels().max(self.deltas.len());
        let mut levels = Vec::with_capacity(num_levels);

        for index in 0..num_levels {
            let base = self.base.level(index);
            let Some(delta) = self.deltas.get(index) else {
                levels.push(Level::from_tables(base.to_vec()));
                continue;
            };

            let mut tables: Vec<Arc<TableFile>> = base
                .iter()
                .filter(|t| !delta.deleted.contains(&t.num) && !delta.added.contains_key(&t.num))
                .cloned()
                .collect();
            tables.extend(delta.added.values().cloned());

            if index == 0 {
                tables.sort_by_key(|t| t.num);
            } else {
                tables.sort_by(|a, b| cmp.compare(&a.min_key, &b.min_key).then(a.num.cmp(&b.num)));
            }

            let level = Level::from_tables(tables);
            if strict && index > 0 {
                if let Some((a, b)) = level.find_overlapping_pair(cmp.as_ref()) {
                    warn!(level = index, a, b, "rejecting version with overlapping tables");
                    return Err(Error::Corruption(format!(
                        "level {index}: tables {a} and {b} overlap"
                    )));
                }
            }
            levels.push(level);
        }

        let version = Version::from_levels(cmp, levels);
        debug!(
            levels = version.num_levels(),
            tables = version.total_files(),
            "staged version finished"
        );
        Ok(Arc::new(version))
    }
}
