use std::cmp::Ordering;
use std::mem;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::comparator::Comparator;
use crate::error::{Error, Result};

/// Maximum height of a skip list tower. LevelDB uses 12.
pub const MAX_HEIGHT: usize = 12;

/// Each extra level is taken with probability 1/BRANCHING.
const BRANCHING: u32 = 4;

/// Fixed seed so tower heights are reproducible run to run.
const HEIGHT_SEED: u64 = 0xdead_beef;

/// Record id of the head sentinel. Also the "nil" successor, since the
/// sentinel is never anyone's successor.
pub const NIL: usize = 0;

// Record layout inside the record arena, in usize slots:
//
//   [key_off][key_len][val_off][val_len][prefix][height][next_0 .. next_{height-1}]
//
// A record id is the slot index of its first field.
const KEY_OFF: usize = 0;
const KEY_LEN: usize = 1;
const VAL_OFF: usize = 2;
const VAL_LEN: usize = 3;
const PREFIX: usize = 4;
const HEIGHT: usize = 5;
const NEXT: usize = 6;

/// Big-endian value of the first `usize` bytes of `key`, zero padded.
///
/// For bytewise order, comparing prefixes numerically agrees with comparing
/// the keys whenever the prefixes differ. Equal prefixes fall back to a full
/// comparison.
fn quick_prefix(key: &[u8]) -> usize {
    let mut buf = [0u8; mem::size_of::<usize>()];
    let n = key.len().min(buf.len());
    buf[..n].copy_from_slice(&key[..n]);
    usize::from_be_bytes(buf)
}

/// Skip list whose records live in two flat arenas instead of boxed nodes.
///
/// Key and value bytes are appended to `kv`; record headers and forward
/// links are appended to `nodes`. Links are record ids (slot offsets into
/// `nodes`), so the structure holds no pointers and no ownership cycles.
///
/// ```text
/// Level 3:  HEAD ──────────────────────────────► 50 ──────────► NIL
/// Level 2:  HEAD ──────────► 20 ────────────────► 50 ──────────► NIL
/// Level 1:  HEAD ──► 10 ──► 20 ────► 35 ────────► 50 ──► 60 ──► NIL
/// Level 0:  HEAD ──► 10 ──► 20 ──► 25 ──► 35 ──► 50 ──► 60 ──► 70 ► NIL
/// ```
///
/// Nothing is ever freed: a removed record is unlinked from every level but
/// its bytes stay in the arenas until [`reset`](Self::reset). Not
/// synchronized; [`MemTable`](super::MemTable) wraps it in a lock.
pub struct SkipList {
    cmp: Arc<dyn Comparator>,
    quick_cmp: bool,
    rng: StdRng,
    kv: Vec<u8>,
    nodes: Vec<usize>,
    /// Update path reused by insert/remove: per level, the last record
    /// before the search key.
    path: [usize; MAX_HEIGHT],
    height: usize,
    len: usize,
    kv_size: usize,
    /// Bumped on every reset so cursors can detect stale record ids.
    generation: u64,
}

impl SkipList {
    /// Creates an empty list whose key/value arena starts with `capacity`
    /// bytes reserved.
    pub fn new(cmp: Arc<dyn Comparator>, capacity: usize) -> Self {
        let quick_cmp = cmp.is_bytewise();
        let mut list = SkipList {
            cmp,
            quick_cmp,
            rng: StdRng::seed_from_u64(HEIGHT_SEED),
            kv: Vec::with_capacity(capacity),
            nodes: Vec::new(),
            path: [NIL; MAX_HEIGHT],
            height: 1,
            len: 0,
            kv_size: 0,
            generation: 0,
        };
        list.push_sentinel();
        list
    }

    fn push_sentinel(&mut self) {
        self.nodes.extend_from_slice(&[0, 0, 0, 0, 0, MAX_HEIGHT]);
        self.nodes.extend_from_slice(&[NIL; MAX_HEIGHT]);
    }

    /// Empties the list, keeping the allocated arenas for reuse.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(HEIGHT_SEED);
        self.kv.clear();
        self.nodes.clear();
        self.push_sentinel();
        self.path = [NIL; MAX_HEIGHT];
        self.height = 1;
        self.len = 0;
        self.kv_size = 0;
        self.generation += 1;
    }

    /// Tower height for a new record: 1, plus one more level with
    /// probability 1/4 each time, capped at `MAX_HEIGHT`.
    fn random_height(&mut self) -> usize {
        let mut h = 1;
        while h < MAX_HEIGHT && self.rng.gen_range(0..BRANCHING) == 0 {
            h += 1;
        }
        h
    }

    pub fn key_of(&self, node: usize) -> &[u8] {
        let off = self.nodes[node + KEY_OFF];
        &self.kv[off..off + self.nodes[node + KEY_LEN]]
    }

    pub fn value_of(&self, node: usize) -> &[u8] {
        let off = self.nodes[node + VAL_OFF];
        &self.kv[off..off + self.nodes[node + VAL_LEN]]
    }

    fn height_of(&self, node: usize) -> usize {
        self.nodes[node + HEIGHT]
    }

    pub fn next_at(&self, node: usize, level: usize) -> usize {
        self.nodes[node + NEXT + level]
    }

    fn set_next_at(&mut self, node: usize, level: usize, next: usize) {
        self.nodes[node + NEXT + level] = next;
    }

    /// Compares the key of `node` against `key`.
    fn compare_node(&self, node: usize, key: &[u8], prefix: usize) -> Ordering {
        if self.quick_cmp {
            match self.nodes[node + PREFIX].cmp(&prefix) {
                Ordering::Equal => self.key_of(node).cmp(key),
                other => other,
            }
        } else {
            self.cmp.compare(self.key_of(node), key)
        }
    }

    /// Finds the first record with key >= `key`. Returns `(record, exact)`,
    /// with `NIL` when every key is smaller.
    ///
    /// With `path`, records per level the last record before `key`; the
    /// search then always descends to level 0 so the path is complete.
    pub fn find_ge(&self, key: &[u8], mut path: Option<&mut [usize; MAX_HEIGHT]>) -> (usize, bool) {
        let prefix = quick_prefix(key);
        let mut node = NIL;
        let mut h = self.height - 1;
        loop {
            let next = self.next_at(node, h);
            let cmp = if next == NIL {
                Ordering::Greater
            } else {
                self.compare_node(next, key, prefix)
            };
            if cmp == Ordering::Less {
                node = next;
                continue;
            }
            match path.as_deref_mut() {
                Some(path) => path[h] = node,
                None if cmp == Ordering::Equal => return (next, true),
                None => {}
            }
            if h == 0 {
                return (next, cmp == Ordering::Equal);
            }
            h -= 1;
        }
    }

    /// First record with key > `key`, or `NIL`.
    pub fn find_gt(&self, key: &[u8]) -> usize {
        match self.find_ge(key, None) {
            (node, true) => self.next_at(node, 0),
            (node, false) => node,
        }
    }

    /// Last record with key < `key`, or `NIL`.
    pub fn find_lt(&self, key: &[u8]) -> usize {
        let prefix = quick_prefix(key);
        let mut node = NIL;
        let mut h = self.height - 1;
        loop {
            let next = self.next_at(node, h);
            if next == NIL || self.compare_node(next, key, prefix) != Ordering::Less {
                if h == 0 {
                    return node;
                }
                h -= 1;
            } else {
                node = next;
            }
        }
    }

    /// Last record in the list, or `NIL` when empty.
    pub fn find_last(&self) -> usize {
        let mut node = NIL;
        let mut h = self.height - 1;
        loop {
            let next = self.next_at(node, h);
            if next == NIL {
                if h == 0 {
                    return node;
                }
                h -= 1;
            } else {
                node = next;
            }
        }
    }

    /// First record in the list, or `NIL` when empty.
    pub fn first(&self) -> usize {
        self.next_at(NIL, 0)
    }

    /// Inserts `key`, or overwrites its value if present.
    ///
    /// An overwrite appends the new value bytes and repoints the record;
    /// the old bytes stay behind in the arena.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) {
        let mut path = mem::take(&mut self.path);
        let (found, exact) = self.find_ge(key, Some(&mut path));

        if exact {
            let val_off = self.kv.len();
            self.kv.extend_from_slice(value);
            let old_len = self.nodes[found + VAL_LEN];
            self.nodes[found + VAL_OFF] = val_off;
            self.nodes[found + VAL_LEN] = value.len();
            self.kv_size = self.kv_size - old_len + value.len();
            self.path = path;
            return;
        }

        let h = self.random_height();
        if h > self.height {
            for slot in &mut path[self.height..h] {
                *slot = NIL;
            }
            self.height = h;
        }

        let key_off = self.kv.len();
        self.kv.extend_from_slice(key);
        let val_off = self.kv.len();
        self.kv.extend_from_slice(value);

        let node = self.nodes.len();
        self.nodes
            .extend_from_slice(&[key_off, key.len(), val_off, value.len(), quick_prefix(key), h]);
        for (level, &prev) in path[..h].iter().enumerate() {
            let next = self.next_at(prev, level);
            self.nodes.push(next);
        }
        for (level, &prev) in path[..h].iter().enumerate() {
            self.set_next_at(prev, level, node);
        }

        self.kv_size += key.len() + value.len();
        self.len += 1;
        self.path = path;
    }

    /// Unlinks `key` from every level it sits on. Its bytes are not reclaimed.
    pub fn remove(&mut self, key: &[u8]) -> Result<()> {
        let mut path = mem::take(&mut self.path);
        let (node, exact) = self.find_ge(key, Some(&mut path));
        if !exact {
            self.path = path;
            return Err(Error::NotFound);
        }

        for (level, &prev) in path[..self.height_of(node)].iter().enumerate() {
            let next = self.next_at(node, level);
            self.set_next_at(prev, level, next);
        }

        self.kv_size -= self.nodes[node + KEY_LEN] + self.nodes[node + VAL_LEN];
        self.len -= 1;
        self.path = path;
        Ok(())
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        match self.find_ge(key, None) {
            (node, true) => Some(self.value_of(node)),
            _ => None,
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.find_ge(key, None).1
    }

    /// Smallest entry with key >= `key`.
    pub fn find(&self, key: &[u8]) -> Option<(&[u8], &[u8])> {
        match self.find_ge(key, None) {
            (NIL, _) => None,
            (node, _) => Some((self.key_of(node), self.value_of(node))),
        }
    }

    pub fn comparator(&self) -> &Arc<dyn Comparator> {
        &self.cmp
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live key + value bytes. Bytes of removed or overwritten entries are
    /// not counted even though they still occupy the arena.
    pub fn kv_size(&self) -> usize {
        self.kv_size
    }

    /// Bytes appended to the key/value arena, live or not.
    pub fn kv_used(&self) -> usize {
        self.kv.len()
    }

    /// Bytes taken by the record arena.
    pub fn record_bytes(&self) -> usize {
        self.nodes.len() * mem::size_of::<usize>()
    }

    pub fn capacity(&self) -> usize {
        self.kv.capacity()
    }

    /// Bytes the key/value arena can take before it must grow.
    pub fn free(&self) -> usize {
        self.kv.capacity() - self.kv.len()
    }

    /// Current number of levels in use.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
