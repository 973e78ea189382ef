// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::memory::{MemoryAccounting, MemoryLimits};

fn allocator() -> Allocator {
    Allocator::new(Arc::new(MemoryAccounting::new()))
}

#[test]
fn test_hash_formula() {
    // 31 * 'A' + 'B' = 2081
    assert_eq!(hash_key("AB", 4096), 2081);
    assert_eq!(hash_key("AB", 256), 2081 % 256);
    assert_eq!(hash_key("", 17), 0);
}

#[test]
fn test_hash_is_case_insensitive() {
    for key in ["employee", "Hr.Address_T", "x1"] {
        assert_eq!(hash_key(key, 97), hash_key(&key.to_uppercase(), 97));
    }
}

#[test]
fn test_zero_buckets_rejected() {
    let err = HashTable::new(0, ValueKind::Text, &allocator()).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_lookup_ignores_case() {
    let mut table = HashTable::new(16, ValueKind::Text, &allocator()).unwrap();
    table.add_string("Name", "first").unwrap();

    let entry = table.lookup("NAME").unwrap();
    assert_eq!(entry.key(), "Name");
    assert_eq!(table.get_string("name").unwrap(), Some("first"));
    assert!(table.lookup("other").is_none());
}

#[test]
fn test_lookup_or_create() {
    let mut table = HashTable::new(8, ValueKind::Integer, &allocator()).unwrap();
    assert!(table.lookup_or_create("k", false).unwrap().is_none());
    assert_eq!(table.entry_count(), 0);

    let entry = table.lookup_or_create("k", true).unwrap().unwrap();
    assert_eq!(entry.value_count(), 0);
    assert_eq!(table.entry_count(), 1);

    // Second creation finds the existing entry.
    table.lookup_or_create("K", true).unwrap().unwrap();
    assert_eq!(table.entry_count(), 1);
}

#[test]
fn test_values_keep_insertion_order() {
    let mut table = HashTable::new(4, ValueKind::Integer, &allocator()).unwrap();
    table.add_int("k", 3).unwrap();
    table.add_int("K", 1).unwrap();
    table.add_int("k", 2).unwrap();

    let values: Vec<i32> = table
        .lookup("k")
        .unwrap()
        .values()
        .filter_map(HashValue::as_int)
        .collect();
    assert_eq!(values, vec![3, 1, 2]);
    assert_eq!(table.get_int("k").unwrap(), Some(3));
}

#[test]
fn test_collisions_chain_in_insertion_order() {
    let mut table = HashTable::new(1, ValueKind::Text, &allocator()).unwrap();
    for key in ["c", "a", "b"] {
        table.add_string(key, key).unwrap();
    }
    let keys: Vec<&str> = table.bucket(0).unwrap().iter().map(HashEntry::key).collect();
    assert_eq!(keys, vec!["c", "a", "b"]);
    assert!(table.bucket(1).is_err());
}

#[test]
fn test_kind_mismatch() {
    let mut table = HashTable::new(8, ValueKind::Text, &allocator()).unwrap();
    table.add_string("k", "v").unwrap();

    assert!(matches!(
        table.add_int("k", 1).unwrap_err(),
        Error::TypeMismatch { .. }
    ));
    assert!(matches!(
        table.get_int("k").unwrap_err(),
        Error::TypeMismatch { .. }
    ));
    assert!(matches!(
        table.get_pointer("k").unwrap_err(),
        Error::TypeMismatch { .. }
    ));
    // Mismatched add left nothing behind.
    assert_eq!(table.lookup("k").unwrap().value_count(), 1);
}

#[test]
fn test_pointer_values() {
    let mut table = HashTable::new(8, ValueKind::Pointer, &allocator()).unwrap();
    table.add_pointer("answer", Arc::new(42u64)).unwrap();

    let value = table.get_pointer_as::<u64>("answer").unwrap().unwrap();
    assert_eq!(*value, 42);
    assert!(table.get_pointer_as::<String>("answer").is_err());
    assert!(table.get_pointer("missing").unwrap().is_none());
}

#[test]
fn test_iteration_covers_all_entries() {
    let mut table = HashTable::new(3, ValueKind::Integer, &allocator()).unwrap();
    for i in 0..20 {
        table.add_int(&format!("key{i}"), i).unwrap();
    }
    assert_eq!(table.iter().count(), 20);
    let per_bucket: usize = (0..table.bucket_count())
        .map(|b| table.bucket(b).unwrap().len())
        .sum();
    assert_eq!(per_bucket, 20);
}

#[test]
fn test_memory_is_returned_on_destroy() {
    let alloc = allocator();
    let mut table = HashTable::new(32, ValueKind::Text, &alloc).unwrap();
    for i in 0..10 {
        table.add_string(&format!("k{i}"), "some value").unwrap();
    }
    assert!(alloc.accounting().bytes(Category::Internal) > 0);
    table.destroy();
    assert_eq!(alloc.accounting().bytes(Category::Internal), 0);
}

#[test]
fn test_out_of_memory_mid_population() {
    let accounting = Arc::new(MemoryAccounting::with_limits(
        MemoryLimits::default().with_internal(2048),
    ));
    let alloc = Allocator::new(Arc::clone(&accounting));
    let mut table = HashTable::new(8, ValueKind::Text, &alloc).unwrap();

    let mut failed = false;
    for i in 0..1000 {
        if let Err(err) = table.add_string(&format!("key{i}"), "payload") {
            assert!(matches!(err, Error::OutOfMemory { .. }));
            failed = true;
            break;
        }
    }
    assert!(failed);

    // Partially populated table tears down cleanly.
    drop(table);
    assert_eq!(accounting.bytes(Category::Internal), 0);
}
