use std::sync::Arc;

use crate::comparator::{Comparator, default_comparator};
use crate::error::Error;
use crate::iterator::{IterState, Releaser, StorageIterator};
use crate::types::{Entry, Range};

/// Cursor over a fixed, sorted, shared run of entries.
///
/// Used for small in-memory runs and as the cursor over decoded tables.
/// Entries must already be sorted by the iterator's comparator with no
/// duplicate keys. An optional range narrows the visible window to
/// `[start, limit)`.
pub struct ArrayIterator {
    cmp: Arc<dyn Comparator>,
    entries: Arc<[Entry]>,
    /// Visible window is `entries[lo..hi]`.
    lo: usize,
    hi: usize,
    pos: usize,
    state: IterState,
    err: Option<Error>,
    releaser: Releaser<'static>,
}

impl ArrayIterator {
    /// Iterator over `entries` under bytewise order.
    pub fn new(entries: Vec<Entry>) -> Self {
        Self::with_comparator(default_comparator(), entries)
    }

    pub fn with_comparator(cmp: Arc<dyn Comparator>, entries: Vec<Entry>) -> Self {
        Self::from_shared(cmp, entries.into(), None)
    }

    /// Iterator over a shared run, clipped to `range` when given.
    pub fn from_shared(cmp: Arc<dyn Comparator>, entries: Arc<[Entry]>, range: Option<&Range>) -> Self {
        let (mut lo, mut hi) = (0, entries.len());
        if let Some(range) = range {
            if let Some(start) = &range.start {
                lo = entries.partition_point(|(k, _)| cmp.compare(k, start).is_lt());
            }
            if let Some(limit) = &range.limit {
                hi = entries.partition_point(|(k, _)| cmp.compare(k, limit).is_lt());
            }
            hi = hi.max(lo);
        }
        ArrayIterator {
            cmp,
            entries,
            lo,
            hi,
            pos: 0,
            state: IterState::Unpositioned,
            err: None,
            releaser: Releaser::new(),
        }
    }

    /// Number of entries inside the visible window.
    pub fn len(&self) -> usize {
        self.hi - self.lo
    }

    pub fn is_empty(&self) -> bool {
        self.lo == self.hi
    }

    fn check_released(&mut self) -> bool {
        if self.releaser.is_released() {
            self.err = Some(Error::IteratorReleased);
            return true;
        }
        false
    }
}

impl StorageIterator for ArrayIterator {
    fn first(&mut self) -> bool {
        if self.check_released() {
            return false;
        }
        if self.lo == self.hi {
            self.state = IterState::AtEnd;
            return false;
        }
        self.pos = self.lo;
        self.state = IterState::Forward;
        true
    }

    fn last(&mut self) -> bool {
        if self.check_released() {
            return false;
        }
        if self.lo == self.hi {
            self.state = IterState::AtStart;
            return false;
        }
        self.pos = self.hi - 1;
        self.state = IterState::Backward;
        true
    }

    fn seek(&mut self, key: &[u8]) -> bool {
        if self.check_released() {
            return false;
        }
        let window = &self.entries[self.lo..self.hi];
        let pos = self.lo + window.partition_point(|(k, _)| self.cmp.compare(k, key).is_lt());
        if pos >= self.hi {
            self.state = IterState::AtEnd;
            return false;
        }
        self.pos = pos;
        self.state = IterState::Forward;
        true
    }

    fn next(&mut self) -> bool {
        if self.check_released() {
            return false;
        }
        match self.state {
            IterState::Unpositioned | IterState::AtStart => self.first(),
            IterState::AtEnd | IterState::Released => false,
            IterState::Forward | IterState::Backward => {
                if self.pos + 1 < self.hi {
                    self.pos += 1;
                    self.state = IterState::Forward;
                    true
                } else {
                    self.state = IterState::AtEnd;
                    false
                }
            }
        }
    }

    fn prev(&mut self) -> bool {
        if self.check_released() {
            return false;
        }
        match self.state {
            IterState::Unpositioned | IterState::AtEnd => self.last(),
            IterState::AtStart | IterState::Released => false,
            IterState::Forward | IterState::Backward => {
                if self.pos > self.lo {
                    self.pos -= 1;
                    self.state = IterState::Backward;
                    true
                } else {
                    self.state = IterState::AtStart;
                    false
                }
            }
        }
    }

    fn is_valid(&self) -> bool {
        self.state.is_positioned()
    }

    fn key(&self) -> &[u8] {
        if self.is_valid() { &self.entries[self.pos].0 } else { &[] }
    }

    fn value(&self) -> &[u8] {
        if self.is_valid() { &self.entries[self.pos].1 } else { &[] }
    }

    fn error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    fn release(&mut self) {
        if self.releaser.release() {
            self.state = IterState::Released;
            self.entries = Arc::from(Vec::new());
            self.lo = 0;
            self.hi = 0;
        }
    }

    fn is_released(&self) -> bool {
        self.releaser.is_released()
    }
}
