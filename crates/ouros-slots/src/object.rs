//! Objects whose attributes are laid out by a [`Shape`].
//!
//! `PythonBasicObject` is the addressed object of every attribute read and write. It holds its
//! current shape plus two backing arrays:
//!
//! - `primitives`: one 64-bit word per Int / Float / Boolean slot, never boxed
//! - `objects`: one [`Value`] per Object-kind slot
//!
//! Both arrays keep the first few slots inline so small objects don't allocate storage.
//!
//! # Moving between shapes
//!
//! - [`extend`](PythonBasicObject::extend) follows an add-attribute transition: indices are
//!   preserved and the arrays only grow.
//! - [`migrate`](PythonBasicObject::migrate) follows a generalize transition: indices are
//!   recomputed, so every attribute is read through the old location and written through the
//!   new one, boxing the generalized primitive on the way.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::{intern::StringId, shape::Shape, value::Value};

/// Number of slots of each array stored inline before spilling to the heap.
const INLINE_SLOTS: usize = 4;

#[derive(Debug, Clone)]
pub struct PythonBasicObject {
    shape: Rc<Shape>,
    primitives: SmallVec<[u64; INLINE_SLOTS]>,
    objects: SmallVec<[Value; INLINE_SLOTS]>,
}

impl PythonBasicObject {
    /// Creates an object with storage sized for `shape`.
    ///
    /// Primitive slots start zeroed and object slots start as `None`; callers add attributes
    /// through a write immediately after moving to a shape that contains them.
    #[must_use]
    pub fn new(shape: Rc<Shape>) -> Self {
        let primitives = SmallVec::from_elem(0, shape.primitive_count());
        let objects = SmallVec::from_elem(Value::None, shape.object_count());
        Self {
            shape,
            primitives,
            objects,
        }
    }

    #[inline]
    #[must_use]
    pub fn shape(&self) -> &Rc<Shape> {
        &self.shape
    }

    /// Loads attribute `name`, boxing primitive slots.
    #[must_use]
    pub fn get_attr(&self, name: StringId) -> Option<Value> {
        self.shape.location(name).map(|location| location.read(self))
    }

    /// Returns all attributes in insertion order.
    #[must_use]
    pub fn attrs(&self) -> Vec<(StringId, Value)> {
        self.shape
            .attributes()
            .map(|(name, location)| (name, location.read(self)))
            .collect()
    }

    /// Moves this object to `shape`, which must extend the current shape with new attributes
    /// while keeping every existing location.
    pub fn extend(&mut self, shape: Rc<Shape>) {
        debug_assert!(
            self.shape
                .attributes()
                .all(|(name, location)| shape.location(name) == Some(location)),
            "extend target must preserve existing locations"
        );
        self.primitives.resize(shape.primitive_count(), 0);
        self.objects.resize(shape.object_count(), Value::None);
        self.shape = shape;
    }

    /// Moves this object to `shape`, re-laying out storage.
    ///
    /// `shape` must hold the same attributes as the current shape, each either with the same
    /// kind or widened to Object-kind; that is what
    /// [`ShapeRegistry::generalize`](crate::ShapeRegistry::generalize) returns.
    pub fn migrate(&mut self, shape: Rc<Shape>) {
        debug_assert_eq!(shape.len(), self.shape.len(), "migration target must hold the same attributes");
        let mut migrated = Self::new(Rc::clone(&shape));
        for (name, location) in self.shape.attributes() {
            if let Some(target) = shape.location(name) {
                let stored = target.write(&mut migrated, location.read(self));
                debug_assert!(stored.is_ok(), "migration target must be at least as general as the source");
            }
        }
        *self = migrated;
    }

    #[inline]
    pub(crate) fn primitive_slot(&self, index: usize) -> u64 {
        self.primitives[index]
    }

    #[inline]
    pub(crate) fn set_primitive_slot(&mut self, index: usize, bits: u64) {
        self.primitives[index] = bits;
    }

    #[inline]
    pub(crate) fn object_slot(&self, index: usize) -> &Value {
        &self.objects[index]
    }

    #[inline]
    pub(crate) fn set_object_slot(&mut self, index: usize, value: Value) {
        self.objects[index] = value;
    }
}
