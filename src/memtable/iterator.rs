use crate::error::Error;
use crate::iterator::{IterState, Releaser, StorageIterator};
use crate::memtable::MemTable;
use crate::memtable::skiplist::{NIL, SkipList};
use crate::types::Range;

/// Cursor over a [`MemTable`], optionally clipped to a range.
///
/// Holds a record id and a borrowed table, never the lock. Each step takes
/// the shared lock, moves, and copies the current key and value out, so
/// writers are only held off for a single step. See [`MemTable`] for what
/// that means for concurrent writes.
pub struct MemTableIterator<'a> {
    table: Option<&'a MemTable>,
    range: Option<Range>,
    node: usize,
    /// Generation of the list `node` belongs to.
    generation: u64,
    state: IterState,
    key: Vec<u8>,
    value: Vec<u8>,
    err: Option<Error>,
    releaser: Releaser<'a>,
}

impl<'a> MemTableIterator<'a> {
    pub(crate) fn new(table: &'a MemTable, range: Option<Range>) -> Self {
        MemTableIterator {
            table: Some(table),
            range,
            node: NIL,
            generation: 0,
            state: IterState::Unpositioned,
            key: Vec::new(),
            value: Vec::new(),
            err: None,
            releaser: Releaser::new(),
        }
    }

    fn table(&mut self) -> Option<&'a MemTable> {
        if self.releaser.is_released() {
            self.err = Some(Error::IteratorReleased);
            return None;
        }
        self.table
    }

    /// Loads the entry at `self.node`, dropping it if it falls outside the
    /// range on a checked side. Sets the state for a move in `forward`
    /// direction.
    fn fill(&mut self, list: &SkipList, check_start: bool, check_limit: bool, forward: bool) -> bool {
        self.generation = list.generation();
        if self.node != NIL {
            let key = list.key_of(self.node);
            let cmp = list.comparator();
            let out = match &self.range {
                Some(range) => {
                    let before = check_start && range.start.as_ref().is_some_and(|s| cmp.compare(key, s).is_lt());
                    let after = check_limit && range.limit.as_ref().is_some_and(|l| cmp.compare(key, l).is_ge());
                    before || after
                }
                None => false,
            };
            if !out {
                self.key.clear();
                self.key.extend_from_slice(key);
                self.value.clear();
                self.value.extend_from_slice(list.value_of(self.node));
                self.state = if forward { IterState::Forward } else { IterState::Backward };
                return true;
            }
            self.node = NIL;
        }
        self.key.clear();
        self.value.clear();
        self.state = if forward { IterState::AtEnd } else { IterState::AtStart };
        false
    }
}

impl StorageIterator for MemTableIterator<'_> {
    fn first(&mut self) -> bool {
        let Some(table) = self.table() else {
            return false;
        };
        let list = table.list().read();
        self.node = match self.range.as_ref().and_then(|r| r.start.as_deref()) {
            Some(start) => list.find_ge(start, None).0,
            None => list.first(),
        };
        self.fill(&list, false, true, true)
    }

    fn last(&mut self) -> bool {
        let Some(table) = self.table() else {
            return false;
        };
        let list = table.list().read();
        self.node = match self.range.as_ref().and_then(|r| r.limit.as_deref()) {
            Some(limit) => list.find_lt(limit),
            None => list.find_last(),
        };
        self.fill(&list, true, false, false)
    }

    fn seek(&mut self, key: &[u8]) -> bool {
        let Some(table) = self.table() else {
            return false;
        };
        let list = table.list().read();
        let start = self.range.as_ref().and_then(|r| r.start.as_deref());
        let target = match start {
            Some(start) if list.comparator().compare(key, start).is_lt() => start,
            _ => key,
        };
        self.node = list.find_ge(target, None).0;
        self.fill(&list, false, true, true)
    }

    fn next(&mut self) -> bool {
        match self.state {
            IterState::Unpositioned | IterState::AtStart => return self.first(),
            IterState::AtEnd if !self.releaser.is_released() => return false,
            _ => {}
        }
        let Some(table) = self.table() else {
            return false;
        };
        let list = table.list().read();
        self.node = if list.generation() == self.generation {
            list.next_at(self.node, 0)
        } else {
            // The table was reset under us; the old record id means nothing now.
            list.find_gt(&self.key)
        };
        self.fill(&list, false, true, true)
    }

    fn prev(&mut self) -> bool {
        match self.state {
            IterState::Unpositioned | IterState::AtEnd => return self.last(),
            IterState::AtStart if !self.releaser.is_released() => return false,
            _ => {}
        }
        let Some(table) = self.table() else {
            return false;
        };
        let list = table.list().read();
        self.node = list.find_lt(&self.key);
        self.fill(&list, true, false, false)
    }

    fn is_valid(&self) -> bool {
        self.state.is_positioned()
    }

    fn key(&self) -> &[u8] {
        if self.is_valid() { &self.key } else { &[] }
    }

    fn value(&self) -> &[u8] {
        if self.is_valid() { &self.value } else { &[] }
    }

    fn error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    fn release(&mut self) {
        if self.releaser.release() {
            self.table = None;
            self.node = NIL;
            self.key = Vec::new();
            self.value = Vec::new();
            self.state = IterState::Released;
        }
    }

    fn is_released(&self) -> bool {
        self.releaser.is_released()
    }
}
