// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Runtime-type resolution and materialization of fetched instances.

use objrt::catalog::{InstanceHandle, MemoryCatalog};
use objrt::object::FetchedObject;
use objrt::types::{NumericSubtype, TypeDescriptor};
use objrt::{EngineConfig, Error, Runtime, TypeDescriptorBuilder, TypeFallback};
use std::sync::Arc;

struct Fixture {
    catalog: Arc<MemoryCatalog>,
    shape: Arc<TypeDescriptor>,
    circle: Arc<TypeDescriptor>,
}

fn fixture() -> Fixture {
    let shape = TypeDescriptorBuilder::new("GEO", "SHAPE_T")
        .not_final()
        .text("NAME")
        .build()
        .unwrap();
    let circle = TypeDescriptorBuilder::new("GEO", "CIRCLE_T")
        .extends(&shape)
        .numeric("RADIUS", NumericSubtype::Double)
        .build()
        .unwrap();

    let catalog = Arc::new(MemoryCatalog::new());
    catalog.define(&circle);
    Fixture {
        catalog,
        shape,
        circle,
    }
}

/// Image of a CIRCLE_T built locally, as the transport would deliver it.
fn circle_image(runtime: &Runtime, circle: &Arc<TypeDescriptor>, handle: u64) -> FetchedObject {
    let mut local = runtime.create_object(circle).unwrap();
    local.set_string("NAME", "unit").unwrap();
    local.set_double("RADIUS", 1.0).unwrap();
    FetchedObject::new(InstanceHandle(handle), local.to_image().unwrap())
}

#[test]
fn materialize_uses_runtime_subtype() {
    let fx = fixture();
    fx.catalog.bind(InstanceHandle(1), fx.circle.handle());
    let runtime = Runtime::new(EngineConfig::default(), fx.catalog.clone()).unwrap();

    let fetched = circle_image(&runtime, &fx.circle, 1);
    let obj = runtime.materialize(fetched, &fx.shape).unwrap();

    assert!(obj.descriptor().same_type(&fx.circle));
    assert_eq!(obj.get_double("RADIUS").unwrap(), Some(1.0));
    assert_eq!(obj.get_string("NAME").unwrap().as_deref(), Some("unit"));
    assert_eq!(obj.handle(), Some(InstanceHandle(1)));
    assert_eq!(obj.to_text().unwrap(), "CIRCLE_T('unit', 1)");
}

#[test]
fn runtime_type_is_fetched_once() {
    let fx = fixture();
    for id in 1..=5 {
        fx.catalog.bind(InstanceHandle(id), fx.circle.handle());
    }
    let runtime = Runtime::new(EngineConfig::default(), fx.catalog.clone()).unwrap();

    std::thread::scope(|s| {
        for id in 1..=5 {
            let runtime = &runtime;
            let fx = &fx;
            s.spawn(move || {
                let real = runtime
                    .resolve_real_type(&fx.shape, InstanceHandle(id))
                    .unwrap();
                assert!(real.same_type(&fx.circle));
            });
        }
    });

    assert_eq!(fx.catalog.runtime_calls(), 5);
    assert_eq!(fx.catalog.lookup_calls(), 1);
    assert_eq!(runtime.registry().stats().fetches, 1);
}

#[test]
fn declared_type_is_used_when_instance_reports_it() {
    let fx = fixture();
    fx.catalog.bind(InstanceHandle(9), fx.shape.handle());
    let runtime = Runtime::new(EngineConfig::default(), fx.catalog.clone()).unwrap();

    let real = runtime.resolve_real_type(&fx.shape, InstanceHandle(9)).unwrap();
    assert!(Arc::ptr_eq(&real, &fx.shape));
    assert_eq!(fx.catalog.describe_calls(), 0);
}

#[test]
fn final_types_skip_the_catalog() {
    let fx = fixture();
    let runtime = Runtime::new(EngineConfig::default(), fx.catalog.clone()).unwrap();

    let real = runtime.resolve_real_type(&fx.circle, InstanceHandle(404)).unwrap();
    assert!(Arc::ptr_eq(&real, &fx.circle));
    assert_eq!(fx.catalog.runtime_calls(), 0);
}

#[test]
fn unresolvable_runtime_type_honours_fallback() {
    let fx = fixture();
    let strict = Runtime::new(EngineConfig::default(), fx.catalog.clone()).unwrap();
    assert!(matches!(
        strict.resolve_real_type(&fx.shape, InstanceHandle(404)),
        Err(Error::Backend(_))
    ));

    let config = EngineConfig::default().with_type_fallback(TypeFallback::Declared);
    let lenient = Runtime::new(config, fx.catalog.clone()).unwrap();
    let real = lenient.resolve_real_type(&fx.shape, InstanceHandle(404)).unwrap();
    assert!(real.same_type(&fx.shape));

    // per-call override
    let local = lenient.create_object(&fx.shape).unwrap();
    let fetched = FetchedObject::new(InstanceHandle(404), local.to_image().unwrap());
    assert!(lenient
        .materialize_with(fetched, &fx.shape, TypeFallback::Strict)
        .is_err());
}

#[test]
fn subtype_image_fits_declared_layout_on_fallback() {
    let fx = fixture();
    let config = EngineConfig::default().with_type_fallback(TypeFallback::Declared);
    let runtime = Runtime::new(config, fx.catalog.clone()).unwrap();

    let fetched = circle_image(&runtime, &fx.circle, 500);
    let obj = runtime.materialize(fetched, &fx.shape).unwrap();

    assert!(obj.descriptor().same_type(&fx.shape));
    assert_eq!(obj.get_string("NAME").unwrap().as_deref(), Some("unit"));
    assert!(matches!(
        obj.get_double("RADIUS"),
        Err(Error::AttributeNotFound(_))
    ));
}

#[test]
fn type_info_is_case_insensitive_and_cached() {
    let fx = fixture();
    let runtime = Runtime::new(EngineConfig::default(), fx.catalog.clone()).unwrap();

    let a = runtime.type_info("geo.circle_t").unwrap();
    let b = runtime.type_info("GEO.CIRCLE_T").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(fx.catalog.lookup_calls(), 1);

    assert!(runtime.type_info("GEO.SQUARE_T").is_err());
}
