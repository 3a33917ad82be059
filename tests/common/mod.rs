// Shared helpers for integration tests.
#![allow(dead_code)]

use lsm_core::{BytewiseComparator, Comparator, StorageIterator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub type Pair = (Vec<u8>, Vec<u8>);

pub fn key(i: u32) -> Vec<u8> {
    format!("key{i:06}").into_bytes()
}

pub fn value(i: u32) -> Vec<u8> {
    format!("value{i}").into_bytes()
}

/// `n` sorted pairs built from `key(i * step + offset)`.
pub fn pairs(n: u32, step: u32, offset: u32) -> Vec<Pair> {
    (0..n).map(|i| (key(i * step + offset), value(i * step + offset))).collect()
}

/// Four-byte big-endian key, so numeric order matches byte order.
pub fn be(n: u32) -> Vec<u8> {
    n.to_be_bytes().to_vec()
}

pub fn current(it: &dyn StorageIterator) -> Pair {
    (it.key().to_vec(), it.value().to_vec())
}

pub fn collect_forward(it: &mut dyn StorageIterator) -> Vec<Pair> {
    let mut out = Vec::new();
    let mut ok = it.first();
    while ok {
        out.push(current(it));
        ok = it.next();
    }
    out
}

pub fn collect_backward(it: &mut dyn StorageIterator) -> Vec<Pair> {
    let mut out = Vec::new();
    let mut ok = it.last();
    while ok {
        out.push(current(it));
        ok = it.prev();
    }
    out
}

/// Position of a model iterator over a sorted vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelPos {
    At(usize),
    End,
    Start,
}

/// Checks `it` against `expected` (sorted, unique keys): full walks in both
/// directions, exact and in-between seeks, and a random walk mixing every
/// positioning call.
pub fn check_iterator(it: &mut dyn StorageIterator, expected: &[Pair]) {
    check_iterator_with(it, expected, &BytewiseComparator);
}

/// Like [`check_iterator`] with `expected` sorted by `cmp`. In-between seeks
/// are only derived for bytewise order, where `k + [0]` sits right after `k`.
pub fn check_iterator_with(it: &mut dyn StorageIterator, expected: &[Pair], cmp: &dyn Comparator) {
    assert_eq!(collect_forward(it), expected, "forward walk");
    assert!(!it.is_valid());
    assert!(!it.next(), "next past the end stays exhausted");
    assert!(it.key().is_empty());

    let mut reversed = expected.to_vec();
    reversed.reverse();
    assert_eq!(collect_backward(it), reversed, "backward walk");
    assert!(!it.prev(), "prev before the start stays exhausted");

    for (i, (k, v)) in expected.iter().enumerate() {
        assert!(it.seek(k), "seek to existing key {i}");
        assert_eq!((it.key(), it.value()), (k.as_slice(), v.as_slice()));

        if !cmp.is_bytewise() {
            continue;
        }
        let mut after = k.clone();
        after.push(0);
        match expected.get(i + 1) {
            Some((next, _)) => {
                assert!(it.seek(&after));
                assert_eq!(it.key(), next.as_slice());
            }
            None => assert!(!it.seek(&after)),
        }
    }

    random_walk(it, expected, cmp, 0x5eed, 500);
    assert!(it.error().is_none());
}

fn random_walk(it: &mut dyn StorageIterator, expected: &[Pair], cmp: &dyn Comparator, seed: u64, steps: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = expected.len();
    let edge = |forward: bool| if forward { ModelPos::End } else { ModelPos::Start };

    let mut pos = if it.first() { ModelPos::At(0) } else { ModelPos::End };
    for step in 0..steps {
        let op = rng.gen_range(0..6);
        pos = match op {
            0 => {
                it.first();
                if n == 0 { ModelPos::End } else { ModelPos::At(0) }
            }
            1 => {
                it.last();
                if n == 0 { ModelPos::Start } else { ModelPos::At(n - 1) }
            }
            2 | 3 => {
                it.next();
                match pos {
                    ModelPos::Start if n > 0 => ModelPos::At(0),
                    ModelPos::At(i) if i + 1 < n => ModelPos::At(i + 1),
                    _ => edge(true),
                }
            }
            4 => {
                it.prev();
                match pos {
                    ModelPos::End if n > 0 => ModelPos::At(n - 1),
                    ModelPos::At(i) if i > 0 => ModelPos::At(i - 1),
                    _ => edge(false),
                }
            }
            _ => {
                let target = if n == 0 {
                    b"anything".to_vec()
                } else {
                    expected[rng.gen_range(0..n)].0.clone()
                };
                it.seek(&target);
                match expected.partition_point(|(k, _)| cmp.compare(k, &target).is_lt()) {
                    i if i < n => ModelPos::At(i),
                    _ => ModelPos::End,
                }
            }
        };
        match pos {
            ModelPos::At(i) => {
                assert!(it.is_valid(), "step {step}: expected entry {i}");
                assert_eq!(it.key(), expected[i].0.as_slice(), "step {step}");
                assert_eq!(it.value(), expected[i].1.as_slice(), "step {step}");
            }
            ModelPos::End | ModelPos::Start => assert!(!it.is_valid(), "step {step}: expected exhausted"),
        }
    }
}
