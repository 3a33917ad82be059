use crate::comparator::Comparator;

/// Raw key bytes.
pub type Key = Vec<u8>;

/// Raw value bytes.
pub type Value = Vec<u8>;

/// A key/value pair as held by in-memory sorted runs.
pub type Entry = (Key, Value);

/// Half-open key range `[start, limit)`.
///
/// A `None` start sorts before every key; a `None` limit sorts after every key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Range {
    pub start: Option<Key>,
    pub limit: Option<Key>,
}

impl Range {
    pub fn new(start: impl Into<Key>, limit: impl Into<Key>) -> Self {
        Range {
            start: Some(start.into()),
            limit: Some(limit.into()),
        }
    }

    /// The unbounded range.
    pub fn all() -> Self {
        Range::default()
    }

    /// Smallest range that covers every key starting with `prefix`
    /// under bytewise ordering.
    ///
    /// The limit is the prefix with its last non-0xff byte incremented and
    /// everything after it dropped. A prefix made only of 0xff bytes has no
    /// upper bound.
    pub fn prefix(prefix: &[u8]) -> Self {
        let limit = prefix
            .iter()
            .rposition(|&b| b != 0xff)
            .map(|i| {
                let mut limit = prefix[..=i].to_vec();
                limit[i] += 1;
                limit
            });
        Range {
            start: Some(prefix.to_vec()),
            limit,
        }
    }

    /// Whether `key` falls inside the range under `cmp`.
    pub fn contains(&self, key: &[u8], cmp: &dyn Comparator) -> bool {
        if let Some(start) = &self.start {
            if cmp.compare(key, start).is_lt() {
                return false;
            }
        }
        if let Some(limit) = &self.limit {
            if cmp.compare(key, limit).is_ge() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::BytewiseComparator;

    #[test]
    fn prefix_increments_last_byte() {
        let r = Range::prefix(b"abc");
        assert_eq!(r.start.as_deref(), Some(b"abc".as_slice()));
        assert_eq!(r.limit.as_deref(), Some(b"abd".as_slice()));
    }

    #[test]
    fn prefix_skips_trailing_ff() {
        let r = Range::prefix(&[0x01, 0xff, 0xff]);
        assert_eq!(r.limit.as_deref(), Some([0x02].as_slice()));

        let r = Range::prefix(&[0xff, 0xff]);
        assert_eq!(r.limit, None);
    }

    #[test]
    fn contains_respects_half_open_bounds() {
        let cmp = BytewiseComparator;
        let r = Range::new(b"b".to_vec(), b"d".to_vec());
        assert!(!r.contains(b"a", &cmp));
        assert!(r.contains(b"b", &cmp));
        assert!(r.contains(b"c", &cmp));
        assert!(!r.contains(b"d", &cmp));
        assert!(Range::all().contains(b"anything", &cmp));
    }
}
