//! Tests for storage locations and the write nodes bound to them.
//!
//! These drive nodes directly against hand-built objects, without call sites, so every
//! Generalize signal is visible to the test.
#![expect(clippy::approx_constant, reason = "fixtures use literal decimal values")]

use std::rc::Rc;

use ouros_slots::{
    AttributeReadNode, AttributeWriteNode, Interns, PythonBasicObject, ShapeRegistry, StorageKind, StorageLocation,
    Value,
};
use pretty_assertions::assert_eq;

/// Builds an object with a single attribute `a` stored with `kind`.
fn single_slot(kind: StorageKind) -> (PythonBasicObject, StorageLocation) {
    let mut interns = Interns::new();
    let mut registry = ShapeRegistry::new();
    let root = registry.root();
    let (shape, location) = registry.add_attribute(&root, interns.intern("a"), kind);
    (PythonBasicObject::new(shape), location)
}

fn sample_values() -> Vec<Value> {
    vec![
        Value::None,
        Value::Bool(false),
        Value::Bool(true),
        Value::Int(0),
        Value::Int(-7),
        Value::Int(i64::MAX),
        Value::Float(0.5),
        Value::Float(f64::NEG_INFINITY),
        Value::from("text"),
    ]
}

// =============================================================================
// 1. StorageLocation
// =============================================================================

/// Int-kind writes never fail for ints, and read back the exact integer.
#[test]
fn int_location_round_trips_every_int() {
    let (mut obj, location) = single_slot(StorageKind::Int);
    for n in [0, 1, -1, 42, i64::MIN, i64::MAX] {
        location.write(&mut obj, Value::Int(n)).unwrap();
        assert_eq!(location.read(&obj), Value::Int(n));
        assert_eq!(location.read_int(&obj), Some(n));
    }
}

/// Any non-int value is rejected with the value handed back, and the slot keeps its contents.
#[test]
fn int_location_rejects_non_ints_without_partial_write() {
    let (mut obj, location) = single_slot(StorageKind::Int);
    location.write_int(&mut obj, 99).unwrap();
    for value in sample_values().into_iter().filter(|v| !matches!(v, Value::Int(_))) {
        let signal = location.write(&mut obj, value.clone()).unwrap_err();
        assert_eq!(signal.location(), location);
        assert_eq!(signal.into_value(), value);
        assert_eq!(location.read_int(&obj), Some(99), "slot must be unchanged");
    }
}

/// Object-kind writes accept everything.
#[test]
fn object_location_accepts_every_value() {
    let (mut obj, location) = single_slot(StorageKind::Object);
    for value in sample_values() {
        location.write(&mut obj, value.clone()).unwrap();
        assert_eq!(location.read(&obj), value);
    }
}

#[test]
fn float_location_keeps_exact_bits() {
    let (mut obj, location) = single_slot(StorageKind::Float);
    location.write_float(&mut obj, -0.0).unwrap();
    assert!(location.read_float(&obj).unwrap().is_sign_negative());
    location.write_float(&mut obj, f64::NAN).unwrap();
    assert!(location.read_float(&obj).unwrap().is_nan());
    assert!(location.write_int(&mut obj, 1).is_err());
}

#[test]
fn generalize_signal_describes_the_rejection() {
    let (mut obj, location) = single_slot(StorageKind::Int);
    let signal = location.write(&mut obj, Value::from("s")).unwrap_err();
    assert_eq!(signal.to_string(), "cannot store 'str' value in Int slot 0");
    assert_eq!(signal.value(), &Value::from("s"));
}

// =============================================================================
// 2. AttributeWriteNode
// =============================================================================

/// `create` binds the node to the exact location, and the generic entry round-trips through it.
#[test]
fn created_nodes_round_trip_through_their_location() {
    let cases = [
        (StorageKind::Object, Value::from("anything")),
        (StorageKind::Int, Value::Int(12)),
        (StorageKind::Float, Value::Float(1.25)),
        (StorageKind::Boolean, Value::Bool(true)),
    ];
    for (kind, value) in cases {
        let (mut obj, location) = single_slot(kind);
        let node = AttributeWriteNode::create(location);
        assert_eq!(node.location(), location);
        assert_eq!(node.kind(), kind);
        node.set_value_unchecked(&mut obj, value.clone()).unwrap();
        assert_eq!(location.read(&obj), value);
        assert_eq!(AttributeReadNode::create(location).get_value_unchecked(&obj), value);
    }
}

/// Boolean fast path on an Int-kind slot stores 0 / 1.
#[test]
fn bool_fast_path_on_int_slot_stores_one() {
    let (mut obj, location) = single_slot(StorageKind::Int);
    assert_eq!(location.index(), 0);
    let node = AttributeWriteNode::create(location);
    node.set_boolean_value_unchecked(&mut obj, true).unwrap();
    assert_eq!(location.read_int(&obj), Some(1));
    node.set_boolean_value_unchecked(&mut obj, false).unwrap();
    assert_eq!(location.read_int(&obj), Some(0));
}

/// A Float node stores 3.14, then rejects a str and still holds 3.14.
#[test]
fn float_node_rejects_str_and_keeps_prior_value() {
    let (mut obj, location) = single_slot(StorageKind::Float);
    let node = AttributeWriteNode::create(location);
    node.set_double_value_unchecked(&mut obj, 3.14).unwrap();

    let signal = node.set_value_unchecked(&mut obj, Value::from("text")).unwrap_err();
    assert_eq!(signal.location().kind(), StorageKind::Float);
    assert_eq!(location.read_float(&obj), Some(3.14));
}

/// Repeating an identical write on Object-kind storage is the same as writing once.
#[test]
fn object_writes_are_idempotent() {
    let (mut once, location) = single_slot(StorageKind::Object);
    let mut repeated = once.clone();
    let node = AttributeWriteNode::create(location);

    node.set_value_unchecked(&mut once, Value::from("x")).unwrap();
    for _ in 0..5 {
        node.set_value_unchecked(&mut repeated, Value::from("x")).unwrap();
    }
    assert_eq!(once.attrs(), repeated.attrs());
    assert!(Rc::ptr_eq(once.shape(), repeated.shape()));
}

/// Typed entries on a mismatched primitive node box and forward, surfacing Generalize.
#[test]
fn typed_entries_on_other_kinds_generalize() {
    let (mut obj, location) = single_slot(StorageKind::Boolean);
    let node = AttributeWriteNode::create(location);
    node.set_boolean_value_unchecked(&mut obj, true).unwrap();

    let signal = node.set_int_value_unchecked(&mut obj, 5).unwrap_err();
    assert_eq!(signal.value(), &Value::Int(5));
    let signal = node.set_double_value_unchecked(&mut obj, 5.0).unwrap_err();
    assert_eq!(signal.value(), &Value::Float(5.0));
    assert_eq!(location.read_bool(&obj), Some(true));
}

/// Typed entries on an Object node box the primitive.
#[test]
fn typed_entries_on_object_node_box() {
    let (mut obj, location) = single_slot(StorageKind::Object);
    let node = AttributeWriteNode::create(location);
    node.set_int_value_unchecked(&mut obj, 3).unwrap();
    assert_eq!(location.read(&obj), Value::Int(3));
    node.set_double_value_unchecked(&mut obj, 0.5).unwrap();
    assert_eq!(location.read(&obj), Value::Float(0.5));
    node.set_boolean_value_unchecked(&mut obj, false).unwrap();
    assert_eq!(location.read(&obj), Value::Bool(false));
}
