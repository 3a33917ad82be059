// MemTable under concurrent access: readers, writers and live iterators.

use std::sync::Arc;
use std::thread;

use lsm_core::memtable::MemTable;
use lsm_core::{StorageIterator, default_comparator};

fn kv(i: u32) -> (Vec<u8>, Vec<u8>) {
    (format!("key{i:05}").into_bytes(), format!("val{i:05}").into_bytes())
}

// =============================================================================
// Test 1: Concurrent readers don't block each other
// =============================================================================
#[test]
fn concurrent_readers_dont_block() {
    let mt = Arc::new(MemTable::new(default_comparator(), 0));
    mt.put(b"key1", b"value1");
    mt.put(b"key2", b"value2");

    let mut handles = vec![];
    for _ in 0..10 {
        let mt = Arc::clone(&mt);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                assert_eq!(mt.get(b"key1").unwrap(), b"value1");
                assert_eq!(mt.get(b"key2").unwrap(), b"value2");
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
}

// =============================================================================
// Test 2: Writer and readers work together
// =============================================================================
#[test]
fn writer_and_readers_concurrent() {
    let mt = MemTable::new(default_comparator(), 0);

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..1000 {
                let (k, v) = kv(i);
                mt.put(&k, &v);
            }
        });
        for _ in 0..4 {
            s.spawn(|| {
                for i in 0..1000 {
                    let (k, v) = kv(i);
                    // May or may not be there yet, but never with a foreign value.
                    if let Ok(got) = mt.get(&k) {
                        assert_eq!(got, v);
                    }
                }
            });
        }
    });

    assert_eq!(mt.len(), 1000);
}

// =============================================================================
// Test 3: Iterators during writes and deletes stay sorted and consistent
// =============================================================================
// A live iterator gives no snapshot, but every step must return a key with
// its own value, in strictly ascending order.
#[test]
fn iterators_during_mutation_stay_consistent() {
    let mt = MemTable::new(default_comparator(), 0);
    for i in (0..2000).step_by(2) {
        let (k, v) = kv(i);
        mt.put(&k, &v);
    }

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..2000 {
                let (k, v) = kv(i);
                mt.put(&k, &v);
                if i % 3 == 0 {
                    let _ = mt.delete(&k);
                }
            }
        });
        for _ in 0..4 {
            s.spawn(|| {
                for round in 0..20 {
                    let mut it = mt.iter(None);
                    let mut ok = if round % 2 == 0 { it.first() } else { it.last() };
                    let mut prev: Option<Vec<u8>> = None;
                    while ok {
                        let key = it.key().to_vec();
                        assert_eq!(it.value(), value_for(&key));
                        if let Some(p) = &prev {
                            if round % 2 == 0 {
                                assert!(p < &key, "forward order broken");
                            } else {
                                assert!(p > &key, "backward order broken");
                            }
                        }
                        prev = Some(key);
                        ok = if round % 2 == 0 { it.next() } else { it.prev() };
                    }
                    assert!(it.error().is_none());
                }
            });
        }
    });
}

/// `key01234` pairs with `val01234`.
fn value_for(key: &[u8]) -> Vec<u8> {
    [b"val".as_slice(), &key[3..]].concat()
}

// =============================================================================
// Test 4: Readers never see a half-applied overwrite
// =============================================================================
#[test]
fn overwrites_are_atomic_for_readers() {
    let mt = MemTable::new(default_comparator(), 0);
    mt.put(b"k", &[0u8; 64]);

    thread::scope(|s| {
        s.spawn(|| {
            for round in 1..=255u8 {
                mt.put(b"k", &[round; 64]);
            }
        });
        s.spawn(|| {
            for _ in 0..2000 {
                let v = mt.get(b"k").unwrap();
                assert_eq!(v.len(), 64);
                assert!(v.iter().all(|&b| b == v[0]));
            }
        });
    });
}
