// VersionStaging and VersionSet: building, installing and retiring versions.

mod common;

use std::sync::Arc;

use common::be;
use lsm_core::{Error, Options, TableFile, Version, VersionEdit, VersionSet, default_comparator};

fn empty() -> Arc<Version> {
    Arc::new(Version::new(default_comparator()))
}

fn nums(v: &Version, level: usize) -> Vec<u64> {
    v.level(level).iter().map(|t| t.num).collect()
}

// =============================================================================
// Test 1: Finish applies the edit and leaves the base alone
// =============================================================================
#[test]
fn finish_leaves_base_untouched() {
    let base = empty();
    let mut staging = base.new_staging();
    let mut edit = VersionEdit::new();
    edit.add_table(0, 7, 10, be(1), be(2));
    staging.commit(&edit);
    let next = staging.finish(true).unwrap();

    assert_eq!(base.total_files(), 0);
    assert_eq!(base.num_levels(), 0);
    assert_eq!(nums(&next, 0), vec![7]);
}

// =============================================================================
// Test 2: Levels grow to fit the highest level named
// =============================================================================
#[test]
fn levels_grow_to_fit() {
    let mut staging = empty().new_staging();
    let mut edit = VersionEdit::new();
    edit.add_table(3, 1, 10, be(1), be(2));
    assert_eq!(edit.max_level(), Some(3));
    staging.commit(&edit);
    let v = staging.finish(true).unwrap();

    assert_eq!(v.num_levels(), 4);
    assert_eq!(v.num_files(3), 1);
    assert_eq!(v.num_files(1), 0);
}

// =============================================================================
// Test 3: Level 0 keeps creation order, deeper levels key order
// =============================================================================
#[test]
fn level_ordering() {
    let mut staging = empty().new_staging();
    let mut edit = VersionEdit::new();
    edit.add_table(0, 9, 1, be(1), be(5))
        .add_table(0, 2, 1, be(50), be(60))
        .add_table(0, 5, 1, be(3), be(4))
        .add_table(1, 8, 1, be(30), be(40))
        .add_table(1, 3, 1, be(1), be(2))
        .add_table(1, 4, 1, be(10), be(20));
    staging.commit(&edit);
    let v = staging.finish(true).unwrap();

    assert_eq!(nums(&v, 0), vec![2, 5, 9]);
    assert_eq!(nums(&v, 1), vec![3, 4, 8]);
}

// =============================================================================
// Test 4: Later commits override earlier ones
// =============================================================================
#[test]
fn later_commits_win() {
    let mut setup = VersionEdit::new();
    setup.add_table(1, 1, 1, be(1), be(2)).add_table(1, 2, 1, be(5), be(6));
    let mut staging = empty().new_staging();
    staging.commit(&setup);
    let base = staging.finish(true).unwrap();

    let mut staging = base.new_staging();
    // Add then delete: gone.
    let mut add = VersionEdit::new();
    add.add_table(1, 3, 1, be(10), be(11));
    staging.commit(&add);
    let mut del = VersionEdit::new();
    del.delete_table(1, 3).delete_table(1, 1);
    staging.commit(&del);
    // Delete then re-add with new bounds: present with the new bounds.
    let mut readd = VersionEdit::new();
    readd.add_table(1, 1, 1, be(0), be(3));
    staging.commit(&readd);

    let v = staging.finish(true).unwrap();
    assert_eq!(nums(&v, 1), vec![1, 2]);
    assert_eq!(v.level(1)[0].min_key, be(0));
    assert_eq!(nums(&base, 1), vec![1, 2]);
    assert_eq!(base.level(1)[0].min_key, be(1));
}

// =============================================================================
// Test 5: Delete and add in one edit keeps the added table
// =============================================================================
#[test]
fn delete_then_add_in_one_edit() {
    let mut staging = empty().new_staging();
    let mut edit = VersionEdit::new();
    edit.add_table(0, 4, 1, be(1), be(2)).delete_table(0, 4);
    staging.commit(&edit);
    let v = staging.finish(true).unwrap();
    assert_eq!(nums(&v, 0), vec![4]);
}

// =============================================================================
// Test 6: Strict finish rejects overlapping tables above level 0
// =============================================================================
#[test]
fn strict_rejects_overlap() {
    let mut edit = VersionEdit::new();
    edit.add_table(1, 1, 1, be(1), be(10)).add_table(1, 2, 1, be(5), be(20));

    let mut staging = empty().new_staging();
    staging.commit(&edit);
    assert!(matches!(staging.finish(true), Err(Error::Corruption(_))));

    let mut staging = empty().new_staging();
    staging.commit(&edit);
    let v = staging.finish(false).unwrap();
    assert_eq!(nums(&v, 1), vec![1, 2]);

    // Overlap on level 0 is always fine.
    let mut l0 = VersionEdit::new();
    l0.add_table(0, 1, 1, be(1), be(10)).add_table(0, 2, 1, be(5), be(20));
    let mut staging = empty().new_staging();
    staging.commit(&l0);
    assert!(staging.finish(true).is_ok());
}

// =============================================================================
// Test 7: add_table_file carries a prebuilt handle
// =============================================================================
#[test]
fn add_table_file_handle() {
    let mut edit = VersionEdit::new();
    edit.add_table_file(2, TableFile::new(11, 4096, b"a".to_vec(), b"m".to_vec()));
    assert_eq!(edit.added_tables().len(), 1);
    assert!(edit.deleted_tables().is_empty());
    assert!(!edit.is_empty());

    let mut staging = empty().new_staging();
    staging.commit(&edit);
    let v = staging.finish(true).unwrap();
    assert_eq!(v.level_size(2), 4096);
}

// =============================================================================
// Test 8: VersionSet installs versions and hands out file numbers
// =============================================================================
#[test]
fn version_set_apply_and_numbers() {
    let set = VersionSet::new(&Options::default());
    assert_eq!(set.current().total_files(), 0);

    let first = set.new_file_number();
    let second = set.new_file_number();
    assert!(second > first);

    let mut edit = VersionEdit::new();
    edit.add_table(0, 100, 1, be(1), be(2));
    let v = set.apply(&edit).unwrap();
    assert!(Arc::ptr_eq(&v, &set.current()));
    assert!(set.new_file_number() > 100);
}

// =============================================================================
// Test 9: A failed apply leaves the current version in place
// =============================================================================
#[test]
fn failed_apply_keeps_current() {
    let set = VersionSet::new(&Options::default());
    let mut ok = VersionEdit::new();
    ok.add_table(1, 1, 1, be(1), be(10));
    let before = set.apply(&ok).unwrap();

    let mut bad = VersionEdit::new();
    bad.add_table(1, 2, 1, be(5), be(6));
    assert!(set.apply(&bad).unwrap_err().is_corruption());
    assert!(Arc::ptr_eq(&before, &set.current()));
}

// =============================================================================
// Test 10: Removed tables become obsolete once no version holds them
// =============================================================================
#[test]
fn obsolete_tables_wait_for_readers() {
    let set = VersionSet::new(&Options::default());
    let mut add = VersionEdit::new();
    add.add_table(0, 1, 1, be(1), be(2)).add_table(0, 2, 1, be(3), be(4));
    set.apply(&add).unwrap();

    let reader = set.current();

    let mut del = VersionEdit::new();
    del.delete_table(0, 1);
    set.apply(&del).unwrap();

    // The reader still sees table 1.
    assert!(set.collect_obsolete().is_empty());
    assert_eq!(nums(&reader, 0), vec![1, 2]);

    drop(reader);
    let obsolete: Vec<u64> = set.collect_obsolete().iter().map(|t| t.num).collect();
    assert_eq!(obsolete, vec![1]);
    assert!(set.collect_obsolete().is_empty());
}

// =============================================================================
// Test 11: Debug output lists every level's tables
// =============================================================================
#[test]
fn debug_lists_levels() {
    let mut edit = VersionEdit::new();
    edit.add_table(0, 7, 10, be(1), be(2)).add_table(2, 9, 10, be(3), be(4));
    let mut staging = empty().new_staging();
    staging.commit(&edit);
    let version = staging.finish(true).unwrap();

    let text = format!("{version:?}");
    assert!(text.contains("leveldb.BytewiseComparator"));
    assert!(text.contains("num: 7"));
    assert!(text.contains("num: 9"));
    assert_eq!(version.num_levels(), 3);
}
