//! Unit tests for the assertion library

use core_types::{ErrorKind, JsError, ObjectId, PropertyDescriptor, PropertyKey, Value};
use test262_harness::assert::{
    compare_array, not_same_value, same_value, throws, verify_not_configurable,
    verify_not_enumerable, verify_not_writable, verify_property,
};
use test262_harness::ObjectAccess;
use test262_harness::{AssertionFailure, Heap, VerifyOptions};

#[test]
fn test_same_value_nan_and_signed_zero() {
    let nan = Value::Double(f64::NAN);
    assert!(same_value(&nan, &nan, None).is_ok());

    let err = same_value(&Value::Smi(0), &Value::Double(-0.0), None).unwrap_err();
    assert_eq!(err.to_string(), "Expected SameValue(«0», «-0») to be true");
    assert!(not_same_value(&Value::Double(0.0), &Value::Double(-0.0), None).is_ok());
}

#[test]
fn test_not_same_value_message() {
    let err = not_same_value(&Value::string("a"), &Value::string("a"), Some("keys")).unwrap_err();
    assert_eq!(err.to_string(), "keys Expected «\"a\"» and «\"a\"» to be different");
}

#[test]
fn test_throws() {
    assert!(throws(ErrorKind::TypeError, || Err(JsError::type_error("x")), None).is_ok());

    let err = throws(ErrorKind::TypeError, || Ok(()), None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Expected a TypeError to be thrown but no exception was thrown at all"
    );

    let err = throws(
        ErrorKind::TypeError,
        || Err(JsError::new(ErrorKind::RangeError, "x")),
        Some("bad index"),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "bad index Expected a TypeError but got a RangeError");
}

#[test]
fn test_compare_array() {
    let a = [Value::Smi(1), Value::Double(f64::NAN)];
    let b = [Value::Double(1.0), Value::Double(f64::NAN)];
    assert!(compare_array(&a, &b, None).is_ok());

    let err = compare_array(&a[..1], &b, Some("elements")).unwrap_err();
    assert!(matches!(err, AssertionFailure::ArrayMismatch { .. }));
    assert_eq!(
        err.to_string(),
        "Actual [1] and expected [1, NaN] should have the same contents. elements"
    );
}

#[test]
fn test_verify_property_reports_every_mismatch() {
    let mut heap = Heap::new();
    let obj = heap.create_plain_object();
    let key = PropertyKey::from("x");
    heap.define_own_property(obj, &key, PropertyDescriptor::data(Value::Smi(1), false, true, true))
        .unwrap();

    let expected = PropertyDescriptor::new()
        .with_value(Value::Smi(2))
        .with_writable(true)
        .with_enumerable(true);
    let err = verify_property(&mut heap, obj, &key, &expected, VerifyOptions::default())
        .unwrap_err();

    let AssertionFailure::Property { name, failures } = &err else {
        panic!("expected a property failure, got {:?}", err);
    };
    assert_eq!(name, "obj['x']");
    assert_eq!(
        failures,
        &vec![
            "obj['x'] descriptor value should be 2 (got 1)".to_string(),
            "obj['x'] descriptor should be writable".to_string(),
        ]
    );
    assert!(err.to_string().contains("; "));
    // A failed check leaves the property alone.
    assert!(heap.get_own_property(obj, &key).is_some());
}

#[test]
fn test_verify_property_deletes_unless_restored() {
    let mut heap = Heap::new();
    let to_lower = heap
        .get(heap.intrinsics().string_prototype, &PropertyKey::from("toLowerCase"))
        .unwrap()
        .as_object()
        .unwrap();
    let length = PropertyKey::from("length");
    let expected = PropertyDescriptor::new()
        .with_value(Value::Smi(0))
        .with_writable(false)
        .with_enumerable(false)
        .with_configurable(true);

    verify_property(&mut heap, to_lower, &length, &expected, VerifyOptions { restore: true })
        .unwrap();
    assert!(heap.get_own_property(to_lower, &length).is_some());

    verify_property(&mut heap, to_lower, &length, &expected, VerifyOptions::default()).unwrap();
    assert!(heap.get_own_property(to_lower, &length).is_none());
}

/// Object model whose deletes never succeed
struct StickyHeap(Heap);

impl ObjectAccess for StickyHeap {
    fn get_own_property(&self, object: ObjectId, key: &PropertyKey) -> Option<PropertyDescriptor> {
        self.0.get_own_property(object, key)
    }

    fn get(&self, object: ObjectId, key: &PropertyKey) -> Result<Value, JsError> {
        ObjectAccess::get(&self.0, object, key)
    }

    fn set(
        &mut self,
        object: ObjectId,
        key: &PropertyKey,
        value: Value,
        strict: bool,
    ) -> Result<bool, JsError> {
        ObjectAccess::set(&mut self.0, object, key, value, strict)
    }

    fn delete(&mut self, _: ObjectId, _: &PropertyKey, _: bool) -> Result<bool, JsError> {
        Ok(false)
    }

    fn define_own_property(
        &mut self,
        object: ObjectId,
        key: &PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> Result<bool, JsError> {
        ObjectAccess::define_own_property(&mut self.0, object, key, descriptor)
    }
}

#[test]
fn test_verify_property_reports_failed_delete() {
    let mut heap = Heap::new();
    let obj = heap.create_plain_object();
    let key = PropertyKey::from("x");
    let descriptor = PropertyDescriptor::new()
        .with_value(Value::Smi(1))
        .with_writable(true)
        .with_enumerable(true)
        .with_configurable(true);
    heap.define_own_property(obj, &key, descriptor.clone()).unwrap();

    let mut sticky = StickyHeap(heap);
    let err = verify_property(&mut sticky, obj, &key, &descriptor, VerifyOptions::default())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "obj['x'] descriptor should be configurable but could not be deleted"
    );
    let restore = VerifyOptions { restore: true };
    assert!(verify_property(&mut sticky, obj, &key, &descriptor, restore).is_ok());
}

#[test]
fn test_verify_property_missing() {
    let mut heap = Heap::new();
    let obj = heap.create_plain_object();
    let err = verify_property(
        &mut heap,
        obj,
        &PropertyKey::from("nope"),
        &PropertyDescriptor::new(),
        VerifyOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "obj should have an own property nope");
}

#[test]
fn test_verify_not_writable() {
    let mut heap = Heap::new();
    let global = heap.global();
    let nan = PropertyKey::from("NaN");
    assert!(verify_not_writable(&mut heap, global, &nan, true).is_ok());
    assert!(verify_not_writable(&mut heap, global, &nan, false).is_ok());

    let obj = heap.create_plain_object();
    let key = PropertyKey::from("w");
    heap.set(obj, &key, Value::Smi(1), false).unwrap();
    let err = verify_not_writable(&mut heap, obj, &key, false).unwrap_err();
    assert!(err
        .to_string()
        .contains("obj['w'] descriptor should not be writable (value changed to \"unlikelyValue\")"));
}

#[test]
fn test_verify_not_enumerable_and_not_configurable_keep_property() {
    let mut heap = Heap::new();
    let proto = heap.intrinsics().array_prototype;
    let length = PropertyKey::from("length");
    verify_not_enumerable(&mut heap, proto, &length).unwrap();
    verify_not_configurable(&mut heap, proto, &length).unwrap();
    assert!(heap.get_own_property(proto, &length).is_some());

    let obj = heap.create_plain_object();
    let key = PropertyKey::from("e");
    heap.set(obj, &key, Value::Null, false).unwrap();
    let err = verify_not_enumerable(&mut heap, obj, &key).unwrap_err();
    assert_eq!(err.to_string(), "obj['e'] descriptor should not be enumerable");
}
