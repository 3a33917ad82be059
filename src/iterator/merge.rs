use std::cmp::Ordering;
use std::sync::Arc;

use tracing::warn;

use crate::comparator::Comparator;
use crate::error::Error;
use crate::iterator::{IterState, Releaser, StorageIterator};

/// Merges multiple sorted iterators into a single sorted stream.
///
/// Used for:
/// - Range scans across memtables and every table picked by a `Version`
/// - Compaction (merging tables)
///
/// Sources are ordered by priority: on equal keys the source with the lower
/// index is yielded first, in both directions. Callers put the freshest
/// source first. Duplicates are not collapsed; every entry of every source
/// is yielded.
///
/// Each step rescans all sources, O(N) per step, which is fine for the
/// small fan-in of a read or a compaction.
///
/// Sources are not snapshotted. If one mutates while the merge walks it
/// (a live memtable), the merge sees whatever that source shows at each step.
pub struct MergeIterator<'a> {
    cmp: Arc<dyn Comparator>,
    iters: Vec<Box<dyn StorageIterator + 'a>>,
    strict: bool,
    /// Source the merge is positioned on; meaningful only while valid.
    index: usize,
    state: IterState,
    err: Option<Error>,
    /// Source whose error was latched.
    err_source: Option<usize>,
    releaser: Releaser<'a>,
}

impl<'a> MergeIterator<'a> {
    /// Creates a merge over `iters`, each sorted by `cmp`.
    ///
    /// With `strict` set, any source error stops the merge and is latched;
    /// in debug builds a source whose key fails to strictly advance trips an
    /// assertion. Without it, a source reporting corruption is dropped from
    /// the current step and the merge carries on with the rest.
    pub fn new(iters: Vec<Box<dyn StorageIterator + 'a>>, cmp: Arc<dyn Comparator>, strict: bool) -> Self {
        MergeIterator {
            cmp,
            iters,
            strict,
            index: 0,
            state: IterState::Unpositioned,
            err: None,
            err_source: None,
            releaser: Releaser::new(),
        }
    }

    /// Runs `hook` once, when this iterator is released.
    pub fn set_release_hook(&mut self, hook: impl FnOnce() + Send + 'a) {
        self.releaser.set_hook(hook);
    }

    pub fn num_sources(&self) -> usize {
        self.iters.len()
    }

    /// Index of the source the current entry comes from.
    pub fn source_index(&self) -> Option<usize> {
        self.is_valid().then_some(self.index)
    }

    /// Gate shared by every positioning call.
    fn blocked(&mut self) -> bool {
        if self.releaser.is_released() {
            self.err = Some(Error::IteratorReleased);
            return true;
        }
        self.err.is_some() || self.err_source.is_some()
    }

    /// Checks source `x` after a failed move. Returns true when the error
    /// must stop the merge.
    fn source_failed(&mut self, x: usize) -> bool {
        let Some(err) = self.iters[x].error() else {
            return false;
        };
        if self.strict || !err.is_corruption() {
            self.err_source = Some(x);
            return true;
        }
        warn!(source = x, error = %err, "skipping corrupted merge source");
        false
    }

    /// Positions every source with `op`, then picks the winner.
    fn position_all(&mut self, op: Position<'_>) -> bool {
        for x in 0..self.iters.len() {
            let iter = &mut self.iters[x];
            let ok = match op {
                Position::First => iter.first(),
                Position::Last => iter.last(),
                Position::Seek(key) => iter.seek(key),
            };
            if !ok && self.source_failed(x) {
                return false;
            }
        }
        match op {
            Position::Last => self.select_largest(),
            Position::First | Position::Seek(_) => self.select_smallest(),
        }
    }

    fn select_smallest(&mut self) -> bool {
        let mut best: Option<usize> = None;
        for (x, iter) in self.iters.iter().enumerate() {
            if !iter.is_valid() {
                continue;
            }
            let better = match best {
                None => true,
                Some(b) => self.cmp.compare(iter.key(), self.iters[b].key()) == Ordering::Less,
            };
            if better {
                best = Some(x);
            }
        }
        match best {
            Some(x) => {
                self.index = x;
                self.state = IterState::Forward;
                true
            }
            None => {
                self.state = IterState::AtEnd;
                false
            }
        }
    }

    fn select_largest(&mut self) -> bool {
        let mut best: Option<usize> = None;
        for (x, iter) in self.iters.iter().enumerate() {
            if !iter.is_valid() {
                continue;
            }
            let better = match best {
                None => true,
                Some(b) => self.cmp.compare(iter.key(), self.iters[b].key()) == Ordering::Greater,
            };
            if better {
                best = Some(x);
            }
        }
        match best {
            Some(x) => {
                self.index = x;
                self.state = IterState::Backward;
                true
            }
            None => {
                self.state = IterState::AtStart;
                false
            }
        }
    }

    /// Steps the current source one entry in the given direction.
    fn step_current(&mut self, forward: bool) -> bool {
        let x = self.index;
        let before = (cfg!(debug_assertions) && self.strict).then(|| self.iters[x].key().to_vec());

        let moved = if forward { self.iters[x].next() } else { self.iters[x].prev() };
        if !moved {
            return !self.source_failed(x);
        }

        if let Some(before) = before {
            let expect = if forward { Ordering::Greater } else { Ordering::Less };
            debug_assert_eq!(
                self.cmp.compare(self.iters[x].key(), &before),
                expect,
                "merge source {x} did not advance strictly"
            );
        }
        true
    }

    /// Re-positions every source but the current one so a forward walk can
    /// resume after `(key, index)`.
    ///
    /// Sources before the current one on a tie were already yielded, so they
    /// must move past `key`; sources after it still owe their `key` entry.
    fn turn_forward(&mut self) -> bool {
        let key = self.iters[self.index].key().to_vec();
        for x in 0..self.iters.len() {
            if x == self.index {
                continue;
            }
            let cmp = &self.cmp;
            let iter = &mut self.iters[x];
            let mut ok = iter.seek(&key);
            if ok && x < self.index && cmp.compare(iter.key(), &key) == Ordering::Equal {
                ok = iter.next();
            }
            if !ok && self.source_failed(x) {
                return false;
            }
        }
        true
    }

    /// Mirror of [`turn_forward`](Self::turn_forward) for a backward walk.
    /// Ties keep the lower index first in both directions, so sources after
    /// the current one may stay on `key`.
    fn turn_backward(&mut self) -> bool {
        let key = self.iters[self.index].key().to_vec();
        for x in 0..self.iters.len() {
            if x == self.index {
                continue;
            }
            let cmp = &self.cmp;
            let iter = &mut self.iters[x];
            let ok = if iter.seek(&key) {
                if x > self.index && cmp.compare(iter.key(), &key) == Ordering::Equal {
                    true
                } else {
                    iter.prev()
                }
            } else if iter.error().is_none() {
                iter.last()
            } else {
                false
            };
            if !ok && self.source_failed(x) {
                return false;
            }
        }
        true
    }
}

impl StorageIterator for MergeIterator<'_> {
    fn first(&mut self) -> bool {
        if self.blocked() {
            return false;
        }
        self.position_all(Position::First)
    }

    fn last(&mut self) -> bool {
        if self.blocked() {
            return false;
        }
        self.position_all(Position::Last)
    }

    fn seek(&mut self, key: &[u8]) -> bool {
        if self.blocked() {
            return false;
        }
        self.position_all(Position::Seek(key))
    }

    fn next(&mut self) -> bool {
        if self.blocked() {
            return false;
        }
        match self.state {
            IterState::Unpositioned | IterState::AtStart => return self.first(),
            IterState::AtEnd | IterState::Released => return false,
            IterState::Backward => {
                if !self.turn_forward() {
                    return false;
                }
            }
            IterState::Forward => {}
        }
        if !self.step_current(true) {
            return false;
        }
        self.select_smallest()
    }

    fn prev(&mut self) -> bool {
        if self.blocked() {
            return false;
        }
        match self.state {
            IterState::Unpositioned | IterState::AtEnd => return self.last(),
            IterState::AtStart | IterState::Released => return false,
            IterState::Forward => {
                if !self.turn_backward() {
                    return false;
                }
            }
            IterState::Backward => {}
        }
        if !self.step_current(false) {
            return false;
        }
        self.select_largest()
    }

    fn is_valid(&self) -> bool {
        self.state.is_positioned() && self.err.is_none() && self.err_source.is_none()
    }

    fn key(&self) -> &[u8] {
        if self.is_valid() { self.iters[self.index].key() } else { &[] }
    }

    fn value(&self) -> &[u8] {
        if self.is_valid() { self.iters[self.index].value() } else { &[] }
    }

    fn error(&self) -> Option<&Error> {
        self.err
            .as_ref()
            .or_else(|| self.err_source.and_then(|x| self.iters.get(x)).and_then(|it| it.error()))
    }

    fn release(&mut self) {
        if !self.releaser.is_released() {
            for iter in &mut self.iters {
                iter.release();
            }
            self.iters.clear();
            self.err_source = None;
            self.state = IterState::Released;
            self.releaser.release();
        }
    }

    fn is_released(&self) -> bool {
        self.releaser.is_released()
    }
}

#[derive(Clone, Copy)]
enum Position<'k> {
    First,
    Last,
    Seek(&'k [u8]),
}

impl Drop for MergeIterator<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
