use std::cmp::Ordering;
use std::sync::Arc;

/// Total order over keys.
///
/// Must stay consistent for the whole lifetime of any memtable, table or
/// version that was built with it.
pub trait Comparator: Send + Sync {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;

    /// Name persisted alongside data so mismatched orders can be detected.
    fn name(&self) -> &str;

    /// True only when `compare` is plain lexicographic byte order. Lets the
    /// memtable short-circuit comparisons on an 8-byte numeric prefix.
    fn is_bytewise(&self) -> bool {
        false
    }
}

/// Lexicographic byte order. The default comparator.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytewiseComparator;

impl Comparator for BytewiseComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    fn name(&self) -> &str {
        "leveldb.BytewiseComparator"
    }

    fn is_bytewise(&self) -> bool {
        true
    }
}

pub fn default_comparator() -> Arc<dyn Comparator> {
    Arc::new(BytewiseComparator)
}
