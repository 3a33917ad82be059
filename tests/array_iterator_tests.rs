// ArrayIterator and EmptyIterator: the simple sources every merge builds on.

mod common;

use std::cmp::Ordering;
use std::sync::Arc;

use common::{check_iterator, check_iterator_with, collect_forward, key, pairs};
use lsm_core::memtable::MemTable;
use lsm_core::{ArrayIterator, Comparator, EmptyIterator, Error, Range, StorageIterator};

/// Descending byte order.
struct Reverse;

impl Comparator for Reverse {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        b.cmp(a)
    }

    fn name(&self) -> &str {
        "test.Reverse"
    }
}

// =============================================================================
// Test 1: Model check over a plain run
// =============================================================================
#[test]
fn array_matches_model() {
    let data = pairs(100, 1, 0);
    let mut it = ArrayIterator::new(data.clone());
    assert_eq!(it.len(), 100);
    check_iterator(&mut it, &data);
}

// =============================================================================
// Test 2: Empty run
// =============================================================================
#[test]
fn empty_array_is_exhausted() {
    let mut it = ArrayIterator::new(Vec::new());
    assert!(it.is_empty());
    check_iterator(&mut it, &[]);
}

// =============================================================================
// Test 3: Range narrows the window
// =============================================================================
#[test]
fn range_narrows_window() {
    let data = pairs(50, 2, 0);
    let range = Range::new(data[5].0.clone(), data[9].0.clone());
    let mut it = ArrayIterator::from_shared(lsm_core::default_comparator(), data.clone().into(), Some(&range));
    assert_eq!(it.len(), 4);
    check_iterator(&mut it, &data[5..9]);
}

// =============================================================================
// Test 4: Range outside the data is empty
// =============================================================================
#[test]
fn range_past_data_is_empty() {
    let data = pairs(10, 1, 0);
    let range = Range::new(b"zzz".to_vec(), b"zzzz".to_vec());
    let it = ArrayIterator::from_shared(lsm_core::default_comparator(), data.into(), Some(&range));
    assert!(it.is_empty());
}

// =============================================================================
// Test 5: Custom comparator drives seek and order
// =============================================================================
#[test]
fn custom_comparator_order() {
    let mut data = pairs(20, 2, 0);
    data.reverse();
    let mut it = ArrayIterator::with_comparator(Arc::new(Reverse), data.clone());
    check_iterator_with(&mut it, &data, &Reverse);

    // Under descending order, seeking a missing key lands on the next
    // smaller one, and past the smallest key is exhausted.
    assert!(it.seek(&key(7)));
    assert_eq!(it.key(), key(6).as_slice());
    assert!(it.seek(&key(100)));
    assert_eq!(it.key(), key(38).as_slice());
    assert!(it.seek(&key(0)));
    assert!(!it.next());

    // The memtable honours the same comparator.
    let mt = MemTable::new(Arc::new(Reverse), 0);
    for (k, v) in &data {
        mt.put(k, v);
    }
    assert_eq!(collect_forward(&mut mt.iter(None)), data);
    let mut mit = mt.iter(None);
    check_iterator_with(&mut mit, &data, &Reverse);
    assert!(mit.seek(&key(7)));
    assert_eq!(mit.key(), key(6).as_slice());
}

// =============================================================================
// Test 6: Release drops the entries and latches IteratorReleased
// =============================================================================
#[test]
fn release_latches_error() {
    let mut it = ArrayIterator::new(pairs(3, 1, 0));
    assert!(it.first());
    it.release();
    it.release();

    assert!(it.is_released());
    assert!(it.is_empty());
    assert!(!it.last());
    assert!(matches!(it.error(), Some(Error::IteratorReleased)));
}

// =============================================================================
// Test 7: EmptyIterator carries its error
// =============================================================================
#[test]
fn empty_iterator_with_error() {
    let mut it = EmptyIterator::with_error(Error::Corruption("bad table".into()));
    assert!(!it.first());
    assert!(!it.next());
    assert!(it.error().is_some_and(Error::is_corruption));

    let mut plain = EmptyIterator::new();
    assert!(!plain.last());
    assert!(plain.error().is_none());
    plain.release();
    assert!(!plain.seek(b"a"));
    assert!(matches!(plain.error(), Some(Error::IteratorReleased)));
}
