//! Call-site cached attribute nodes.
//!
//! A node is bound to exactly one [`StorageLocation`] and performs reads or writes through it
//! without looking at the object's shape: the call site that owns the node checks the shape
//! guard first. Nodes are small `Copy` values and are replaced, never mutated, when the call
//! site re-specializes.
//!
//! # Write entries
//!
//! | Entry                          | Object | Int         | Float       | Boolean     |
//! |--------------------------------|--------|-------------|-------------|-------------|
//! | `set_value_unchecked`          | store  | check+store | check+store | check+store |
//! | `set_int_value_unchecked`      | box    | **direct**  | box         | box         |
//! | `set_double_value_unchecked`   | box    | box         | **direct**  | box         |
//! | `set_boolean_value_unchecked`  | box    | **0 / 1**   | box         | **direct**  |
//!
//! "box" means the primitive is wrapped in a [`Value`] and routed through the generic entry;
//! "direct" goes straight to the location's typed write primitive. Every entry may return
//! [`Generalize`](crate::Generalize), and no entry ever swallows it.

use crate::{
    location::{StorageKind, StorageLocation, WriteResult},
    object::PythonBasicObject,
    value::Value,
};

/// Write operation specialized for one storage location.
///
/// Build nodes with [`AttributeWriteNode::create`], which picks the variant matching the
/// location's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeWriteNode {
    Object(StorageLocation),
    Int(StorageLocation),
    Float(StorageLocation),
    Boolean(StorageLocation),
}

impl AttributeWriteNode {
    /// Maps a location to its write-node variant.
    ///
    /// The match over [`StorageKind`] is exhaustive, so a slot kind without a write variant is
    /// rejected at compile time rather than at node construction.
    #[must_use]
    pub const fn create(location: StorageLocation) -> Self {
        match location.kind() {
            StorageKind::Object => Self::Object(location),
            StorageKind::Int => Self::Int(location),
            StorageKind::Float => Self::Float(location),
            StorageKind::Boolean => Self::Boolean(location),
        }
    }

    #[inline]
    #[must_use]
    pub const fn location(self) -> StorageLocation {
        match self {
            Self::Object(location) | Self::Int(location) | Self::Float(location) | Self::Boolean(location) => location,
        }
    }

    #[inline]
    #[must_use]
    pub const fn kind(self) -> StorageKind {
        self.location().kind()
    }

    /// Generic write entry; accepts any value.
    ///
    /// The caller guarantees `object`'s shape is the one this node's location came from.
    #[inline]
    pub fn set_value_unchecked(self, object: &mut PythonBasicObject, value: Value) -> WriteResult {
        self.location().write(object, value)
    }

    /// Integer fast path. Only Int nodes skip boxing.
    #[inline]
    pub fn set_int_value_unchecked(self, object: &mut PythonBasicObject, value: i64) -> WriteResult {
        match self {
            Self::Int(location) => location.write_int(object, value),
            Self::Object(_) | Self::Float(_) | Self::Boolean(_) => self.set_value_unchecked(object, Value::Int(value)),
        }
    }

    /// Float fast path. Only Float nodes skip boxing.
    #[inline]
    pub fn set_double_value_unchecked(self, object: &mut PythonBasicObject, value: f64) -> WriteResult {
        match self {
            Self::Float(location) => location.write_float(object, value),
            Self::Object(_) | Self::Int(_) | Self::Boolean(_) => self.set_value_unchecked(object, Value::Float(value)),
        }
    }

    /// Boolean fast path.
    ///
    /// Boolean nodes write their own slot. Int nodes store the boolean as `0` / `1` through
    /// the Int write primitive, so the attribute reads back as an integer.
    #[inline]
    pub fn set_boolean_value_unchecked(self, object: &mut PythonBasicObject, value: bool) -> WriteResult {
        match self {
            Self::Boolean(location) => location.write_bool(object, value),
            Self::Int(location) => location.write_int(object, i64::from(value)),
            Self::Object(_) | Self::Float(_) => self.set_value_unchecked(object, Value::Bool(value)),
        }
    }
}

/// Read operation specialized for one storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeReadNode {
    Object(StorageLocation),
    Int(StorageLocation),
    Float(StorageLocation),
    Boolean(StorageLocation),
}

impl AttributeReadNode {
    #[must_use]
    pub const fn create(location: StorageLocation) -> Self {
        match location.kind() {
            StorageKind::Object => Self::Object(location),
            StorageKind::Int => Self::Int(location),
            StorageKind::Float => Self::Float(location),
            StorageKind::Boolean => Self::Boolean(location),
        }
    }

    #[inline]
    #[must_use]
    pub const fn location(self) -> StorageLocation {
        match self {
            Self::Object(location) | Self::Int(location) | Self::Float(location) | Self::Boolean(location) => location,
        }
    }

    /// Loads the attribute as a boxed value.
    #[inline]
    #[must_use]
    pub fn get_value_unchecked(self, object: &PythonBasicObject) -> Value {
        self.location().read(object)
    }

    /// Loads an `int` without boxing; `None` if the slot holds another type.
    #[inline]
    #[must_use]
    pub fn get_int_value_unchecked(self, object: &PythonBasicObject) -> Option<i64> {
        self.location().read_int(object)
    }

    #[inline]
    #[must_use]
    pub fn get_double_value_unchecked(self, object: &PythonBasicObject) -> Option<f64> {
        self.location().read_float(object)
    }

    #[inline]
    #[must_use]
    pub fn get_boolean_value_unchecked(self, object: &PythonBasicObject) -> Option<bool> {
        self.location().read_bool(object)
    }
}
