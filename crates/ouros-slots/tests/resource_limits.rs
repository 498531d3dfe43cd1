//! Tests for resource limits enforced while allocating objects and adding attributes.

use ouros_slots::{
    AttributeSetSite, ExcType, LimitedTracker, ResourceLimits, ResourceTracker, RunError, Runtime, SiteState, Value,
};
use pretty_assertions::assert_eq;

fn limited(limits: ResourceLimits) -> Runtime<LimitedTracker> {
    Runtime::with_tracker(LimitedTracker::new(limits))
}

#[test]
fn allocation_limit_raises_uncatchable_memory_error() {
    let mut rt = limited(ResourceLimits::new().max_allocations(2));
    rt.allocate().unwrap();
    rt.allocate().unwrap();
    let err = rt.allocate().unwrap_err();
    assert!(matches!(err, RunError::UncatchableExc(_)), "got {err:?}");
    assert_eq!(err.exc_type(), Some(ExcType::MemoryError));
    assert_eq!(err.to_string(), "MemoryError: allocation limit exceeded: 3 > 2");
    assert_eq!(rt.heap().len(), 2);
    assert_eq!(rt.heap().tracker().allocation_count(), Some(2));
}

#[test]
fn slot_limit_stops_new_attributes_but_not_rewrites() {
    let mut rt = limited(ResourceLimits::new().max_slots_per_object(2));
    let obj = rt.allocate().unwrap();
    let names = ["a", "b", "c"].map(|n| rt.intern(n));
    let mut sites = names.map(AttributeSetSite::new);

    sites[0].execute_int(&mut rt, obj, 1).unwrap();
    sites[1].execute(&mut rt, obj, Value::from("b")).unwrap();
    let err = sites[2].execute_double(&mut rt, obj, 3.0).unwrap_err();
    assert_eq!(err.to_string(), "MemoryError: attribute slot limit exceeded: 3 > 2");
    assert_eq!(sites[2].state(), SiteState::Uninitialized);
    assert_eq!(rt.object(obj).shape().len(), 2);

    // existing attributes keep accepting writes, including generalizing ones
    sites[0].execute(&mut rt, obj, Value::None).unwrap();
    sites[1].execute_int(&mut rt, obj, 2).unwrap();
    assert_eq!(rt.get_attr(obj, names[0]), Some(Value::None));
    assert_eq!(rt.get_attr(obj, names[1]), Some(Value::Int(2)));
}

#[test]
fn limits_deserialize_from_json() {
    let limits: ResourceLimits =
        serde_json::from_str(r#"{"max_allocations": 10, "max_slots_per_object": null}"#).unwrap();
    assert_eq!(limits, ResourceLimits::new().max_allocations(10));

    let rt = limited(limits);
    assert_eq!(rt.heap().tracker().limits().max_allocations, Some(10));
    assert_eq!(rt.heap_stats().tracker_allocations, Some(0));
}
