use std::sync::Arc;

use crate::comparator::Comparator;
use crate::version::TableFile;

/// Tables of one level, in level order.
///
/// Level 0 keeps creation order (ascending file number) and its ranges may
/// overlap. Deeper levels are sorted by min key and hold disjoint ranges.
#[derive(Debug, Clone, Default)]
pub struct Level {
    tables: Vec<Arc<TableFile>>,
}

impl Level {
    pub(crate) fn from_tables(tables: Vec<Arc<TableFile>>) -> Self {
        Level { tables }
    }

    pub fn tables(&self) -> &[Arc<TableFile>] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Sum of table sizes in bytes.
    pub fn size(&self) -> u64 {
        self.tables.iter().map(|t| t.size).sum()
    }

    /// Level-0 overlap: linear scan, newest table first.
    pub(crate) fn overlaps_unsorted(
        &self,
        cmp: &dyn Comparator,
        min: Option<&[u8]>,
        max: Option<&[u8]>,
    ) -> Vec<Arc<TableFile>> {
        self.tables
            .iter()
            .rev()
            .filter(|t| t.overlaps(cmp, min, max))
            .cloned()
            .collect()
    }

    /// Overlap on a sorted, disjoint level, in key order.
    pub(crate) fn overlaps_sorted(
        &self,
        cmp: &dyn Comparator,
        min: Option<&[u8]>,
        max: Option<&[u8]>,
    ) -> Vec<Arc<TableFile>> {
        if let (Some(min), Some(max)) = (min, max) {
            if cmp.compare(max, min).is_lt() {
                return Vec::new();
            }
        }
        let start = match min {
            Some(min) => self.tables.partition_point(|t| cmp.compare(&t.max_key, min).is_lt()),
            None => 0,
        };
        self.tables[start..]
            .iter()
            .take_while(|t| max.is_none_or(|max| cmp.compare(&t.min_key, max).is_le()))
            .cloned()
            .collect()
    }

    /// First adjacent pair whose ranges overlap, if any.
    pub(crate) fn find_overlapping_pair(&self, cmp: &dyn Comparator) -> Option<(u64, u64)> {
        self.tables
            .windows(2)
            .find(|w| cmp.compare(&w[0].max_key, &w[1].min_key).is_ge())
            .map(|w| (w[0].num, w[1].num))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::BytewiseComparator;

    fn table(num: u64, min: &[u8], max: &[u8]) -> Arc<TableFile> {
        Arc::new(TableFile::new(num, 0, min, max))
    }

    #[test]
    fn sorted_overlap_stops_at_max() {
        let level = Level::from_tables(vec![table(1, b"a", b"c"), table(2, b"e", b"g"), table(3, b"i", b"k")]);
        let nums: Vec<u64> = level
            .overlaps_sorted(&BytewiseComparator, Some(b"d"), Some(b"i"))
            .iter()
            .map(|t| t.num)
            .collect();
        assert_eq!(nums, vec![2, 3]);
    }

    #[test]
    fn detects_overlapping_neighbours() {
        let cmp = BytewiseComparator;
        let ok = Level::from_tables(vec![table(1, b"a", b"c"), table(2, b"d", b"f")]);
        assert_eq!(ok.find_overlapping_pair(&cmp), None);

        let touching = Level::from_tables(vec![table(1, b"a", b"c"), table(2, b"c", b"f")]);
        assert_eq!(touching.find_overlapping_pair(&cmp), Some((1, 2)));
    }
}
