//! Storage locations: one attribute slot's kind and its position in an object's storage.
//!
//! An object keeps two backing arrays (see [`PythonBasicObject`]): unboxed 64-bit primitive
//! words and boxed [`Value`]s. A [`StorageLocation`] names one slot in one of those arrays and
//! fixes, for its whole lifetime, which runtime types it accepts:
//!
//! | Kind      | Array      | Accepts           | Encoding                |
//! |-----------|------------|-------------------|-------------------------|
//! | `Object`  | objects    | every value       | `Value` as-is           |
//! | `Int`     | primitives | exactly `int`     | `i64` bit pattern       |
//! | `Float`   | primitives | exactly `float`   | `f64` bit pattern       |
//! | `Boolean` | primitives | exactly `bool`    | `0` / `1`               |
//!
//! A write whose value does not fit returns [`Generalize`] and leaves the slot untouched.
//! Widening is never done in place: the call site obtains an Object-kind location under a
//! new shape from the [`ShapeRegistry`](crate::ShapeRegistry).

use std::fmt;

use strum::{Display, IntoStaticStr};

use crate::{object::PythonBasicObject, value::Value};

/// The kind of values a slot holds, and therefore which backing array it lives in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, IntoStaticStr, serde::Serialize, serde::Deserialize,
)]
pub enum StorageKind {
    Object,
    Int,
    Float,
    Boolean,
}

impl StorageKind {
    /// Whether slots of this kind live in the unboxed primitive array.
    #[inline]
    #[must_use]
    pub const fn is_primitive(self) -> bool {
        !matches!(self, Self::Object)
    }

    /// The slot kind a new attribute gets when its first value is `value`.
    #[must_use]
    pub fn for_value(value: &Value) -> Self {
        match value {
            Value::Int(_) => Self::Int,
            Value::Float(_) => Self::Float,
            Value::Bool(_) => Self::Boolean,
            Value::None | Value::Str(_) | Value::Ref(_) => Self::Object,
        }
    }
}

/// Descriptor of one attribute slot: its kind and its index within the matching backing array.
///
/// Locations are created only by the [`ShapeRegistry`](crate::ShapeRegistry) and owned by the
/// [`Shape`](crate::Shape) that lays them out. They are immutable and `Copy`, so write and read
/// nodes hold their own copy instead of a reference into the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StorageLocation {
    kind: StorageKind,
    index: u32,
}

/// Outcome of a typed write: `Ok(())` when stored, `Err(Generalize)` when the slot kind is too
/// narrow for the value.
pub type WriteResult = Result<(), Generalize>;

impl StorageLocation {
    #[must_use]
    pub(crate) const fn new(kind: StorageKind, index: u32) -> Self {
        Self { kind, index }
    }

    #[inline]
    #[must_use]
    pub const fn kind(self) -> StorageKind {
        self.kind
    }

    /// Index into the primitive array for primitive kinds, into the object array otherwise.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Stores `value` into `object`'s slot according to this location's kind.
    ///
    /// Object-kind locations always succeed. Primitive kinds succeed only when the runtime
    /// type of `value` is exactly the kind's type; otherwise the value is handed back inside
    /// [`Generalize`] and the slot keeps its prior contents.
    #[inline]
    pub fn write(self, object: &mut PythonBasicObject, value: Value) -> WriteResult {
        match (self.kind, value) {
            (StorageKind::Object, value) => {
                object.set_object_slot(self.index(), value);
                Ok(())
            }
            (StorageKind::Int, Value::Int(v)) => self.write_int(object, v),
            (StorageKind::Float, Value::Float(v)) => self.write_float(object, v),
            (StorageKind::Boolean, Value::Bool(v)) => self.write_bool(object, v),
            (StorageKind::Int | StorageKind::Float | StorageKind::Boolean, value) => {
                Err(Generalize::new(self, value))
            }
        }
    }

    /// The Int-kind write primitive.
    ///
    /// Object-kind locations box the integer; Float and Boolean locations reject it.
    #[inline]
    pub fn write_int(self, object: &mut PythonBasicObject, value: i64) -> WriteResult {
        match self.kind {
            StorageKind::Int => {
                object.set_primitive_slot(self.index(), value.cast_unsigned());
                Ok(())
            }
            StorageKind::Object => {
                object.set_object_slot(self.index(), Value::Int(value));
                Ok(())
            }
            StorageKind::Float | StorageKind::Boolean => Err(Generalize::new(self, Value::Int(value))),
        }
    }

    /// The Float-kind write primitive.
    #[inline]
    pub fn write_float(self, object: &mut PythonBasicObject, value: f64) -> WriteResult {
        match self.kind {
            StorageKind::Float => {
                object.set_primitive_slot(self.index(), value.to_bits());
                Ok(())
            }
            StorageKind::Object => {
                object.set_object_slot(self.index(), Value::Float(value));
                Ok(())
            }
            StorageKind::Int | StorageKind::Boolean => Err(Generalize::new(self, Value::Float(value))),
        }
    }

    /// The Boolean-kind write primitive, storing `0` / `1` in the primitive slot.
    #[inline]
    pub fn write_bool(self, object: &mut PythonBasicObject, value: bool) -> WriteResult {
        match self.kind {
            StorageKind::Boolean => {
                object.set_primitive_slot(self.index(), u64::from(value));
                Ok(())
            }
            StorageKind::Object => {
                object.set_object_slot(self.index(), Value::Bool(value));
                Ok(())
            }
            StorageKind::Int | StorageKind::Float => Err(Generalize::new(self, Value::Bool(value))),
        }
    }

    /// Loads the slot as a boxed value.
    #[inline]
    #[must_use]
    pub fn read(self, object: &PythonBasicObject) -> Value {
        match self.kind {
            StorageKind::Object => object.object_slot(self.index()).clone(),
            StorageKind::Int => Value::Int(object.primitive_slot(self.index()).cast_signed()),
            StorageKind::Float => Value::Float(f64::from_bits(object.primitive_slot(self.index()))),
            StorageKind::Boolean => Value::Bool(object.primitive_slot(self.index()) != 0),
        }
    }

    /// Loads the slot as an integer without boxing.
    ///
    /// Returns `None` when the slot does not currently hold an `int`.
    #[inline]
    #[must_use]
    pub fn read_int(self, object: &PythonBasicObject) -> Option<i64> {
        match self.kind {
            StorageKind::Int => Some(object.primitive_slot(self.index()).cast_signed()),
            StorageKind::Object => object.object_slot(self.index()).as_int(),
            StorageKind::Float | StorageKind::Boolean => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn read_float(self, object: &PythonBasicObject) -> Option<f64> {
        match self.kind {
            StorageKind::Float => Some(f64::from_bits(object.primitive_slot(self.index()))),
            StorageKind::Object => object.object_slot(self.index()).as_float(),
            StorageKind::Int | StorageKind::Boolean => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn read_bool(self, object: &PythonBasicObject) -> Option<bool> {
        match self.kind {
            StorageKind::Boolean => Some(object.primitive_slot(self.index()) != 0),
            StorageKind::Object => object.object_slot(self.index()).as_bool(),
            StorageKind::Int | StorageKind::Float => None,
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.index)
    }
}

/// Signal that a typed slot cannot hold a value's runtime type.
///
/// This is the expected outcome of a polymorphic call site, not a defect. It carries the
/// rejected value back to the caller so the write can be retried against a generalized
/// location without re-boxing. The signal travels exactly one frame, from the write node to
/// the attribute call site, which must handle it.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a rejected write must be retried against a generalized location"]
pub struct Generalize {
    location: StorageLocation,
    value: Value,
}

impl Generalize {
    fn new(location: StorageLocation, value: Value) -> Self {
        Self { location, value }
    }

    /// The location that rejected the value.
    #[must_use]
    pub fn location(&self) -> StorageLocation {
        self.location
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Takes back the rejected value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }
}

impl fmt::Display for Generalize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot store '{}' value in {} slot {}",
            self.value.py_type(),
            self.location.kind,
            self.location.index
        )
    }
}

impl std::error::Error for Generalize {}
