// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// End-to-end use of the runtime: registration, object lifecycle and
// per-runtime memory accounting.

use chrono::NaiveDate;
use objrt::catalog::MemoryCatalog;
use objrt::memory::MemoryLimits;
use objrt::object::{CollHandle, ExternalHandle, HandleState};
use objrt::types::{KindTag, NumericSubtype};
use objrt::{Category, EngineConfig, Error, Number, Runtime, TypeDescriptorBuilder};
use std::sync::Arc;

fn runtime(config: EngineConfig) -> Runtime {
    Runtime::new(config, Arc::new(MemoryCatalog::new())).unwrap()
}

#[test]
fn registered_types_resolve_without_catalog() {
    let rt = runtime(EngineConfig::default());
    let order = TypeDescriptorBuilder::new("SALES", "ORDER_T")
        .number("ID")
        .build()
        .unwrap();

    rt.register_type(&order).unwrap();
    let found = rt.type_info("Sales.Order_T").unwrap();
    assert!(Arc::ptr_eq(&found, &order));
    assert_eq!(rt.registry().stats().hits, 1);
    assert_eq!(rt.registry().len(), 1);
}

#[test]
fn order_lifecycle() {
    let rt = runtime(EngineConfig::default().with_date_format("%Y/%m/%d"));
    let line = TypeDescriptorBuilder::new("SALES", "LINE_T")
        .text("SKU")
        .numeric("QTY", NumericSubtype::UInt)
        .build()
        .unwrap();
    let order = TypeDescriptorBuilder::new("SALES", "ORDER_T")
        .number("ID")
        .date("PLACED")
        .object("FIRST_LINE", &line)
        .collection("LINES")
        .build()
        .unwrap();

    let mut obj = rt.create_object(&order).unwrap();
    obj.set_decimal("ID", Number::from_i64(1001)).unwrap();
    let placed = NaiveDate::from_ymd_opt(2025, 12, 24)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    obj.set_date("PLACED", placed).unwrap();
    {
        let mut first = obj.object_mut("FIRST_LINE").unwrap();
        first.set_string("SKU", "A-1").unwrap();
        first.set_uint("QTY", 3).unwrap();
    }
    let lines = CollHandle(ExternalHandle::new(5).unwrap());
    obj.set_collection("LINES", lines).unwrap();

    assert_eq!(obj.state(), HandleState::Allocated);
    assert_eq!(obj.get_collection("LINES").unwrap(), Some(lines));
    assert_eq!(
        obj.to_text().unwrap(),
        "ORDER_T(1001, '2025/12/24', LINE_T('A-1', 3), 'collection#5')"
    );

    let idx = obj.resolve_index("first_line", Some(KindTag::Object), true).unwrap();
    assert_eq!(idx, Some(2));
    assert!(matches!(
        obj.get_timestamp("PLACED"),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn accounting_is_per_runtime() {
    let rt = runtime(EngineConfig::default());
    let desc = TypeDescriptorBuilder::new("", "BLOB_T")
        .raw("DATA")
        .build()
        .unwrap();
    let baseline = rt.accounting().stats();

    let mut obj = rt.create_object(&desc).unwrap();
    obj.set_raw("DATA", &[7u8; 100][..]).unwrap();
    let during = rt.accounting().stats();
    assert!(during.external_bytes > baseline.external_bytes);
    assert!(during.internal_bytes >= baseline.internal_bytes + 100);
    assert_eq!(during.live_handles, baseline.live_handles + 1);

    drop(obj);
    assert_eq!(rt.accounting().stats(), baseline);
}

#[test]
fn limits_come_from_config() {
    let limits = MemoryLimits::default().with_external(1);
    let rt = runtime(EngineConfig::default().with_limits(limits));
    let desc = TypeDescriptorBuilder::new("", "ONE_T")
        .boolean("B")
        .build()
        .unwrap();

    match rt.create_object(&desc) {
        Err(Error::OutOfMemory { category, .. }) => assert_eq!(category, Category::External),
        other => panic!("expected OutOfMemory, got {other:?}"),
    }
}

#[test]
fn zero_bucket_registry_is_rejected() {
    let result = Runtime::new(
        EngineConfig::default().with_registry_buckets(0),
        Arc::new(MemoryCatalog::new()),
    );
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}
