//! Object arena.
//!
//! Objects live in a flat `Vec` and are addressed by [`HeapId`]. The heap is generic over its
//! [`ResourceTracker`], which checks every allocation and every growth of an object's storage.

use std::{collections::BTreeMap, rc::Rc};

use crate::{
    object::PythonBasicObject,
    resource::{ResourceError, ResourceTracker},
    shape::{Shape, ShapeId},
};

/// Unique identifier for objects stored inside the heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct HeapId(usize);

impl HeapId {
    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Snapshot of heap state at a point in time.
///
/// The `objects_by_shape` map uses `BTreeMap` for deterministic iteration order,
/// making snapshots suitable for display and comparison without sort overhead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Total number of live objects on the heap.
    pub live_objects: usize,
    /// Total unboxed primitive slots across all objects.
    pub primitive_slots: usize,
    /// Total boxed object slots across all objects.
    pub object_slots: usize,
    /// Number of live objects currently on each shape.
    pub objects_by_shape: BTreeMap<ShapeId, usize>,
    /// Resource tracker allocation count, if using `LimitedTracker`.
    pub tracker_allocations: Option<usize>,
}

/// Arena of objects addressed by [`HeapId`].
///
/// Objects are never freed; collection is outside the scope of this crate. Every allocation and
/// every storage growth is checked against the heap's [`ResourceTracker`].
#[derive(Debug)]
pub struct Heap<T: ResourceTracker> {
    objects: Vec<PythonBasicObject>,
    tracker: T,
}

impl<T: ResourceTracker> Heap<T> {
    #[must_use]
    pub fn new(capacity: usize, tracker: T) -> Self {
        Self {
            objects: Vec::with_capacity(capacity),
            tracker,
        }
    }

    /// Allocates a new object laid out by `shape`.
    pub fn allocate(&mut self, shape: Rc<Shape>) -> Result<HeapId, ResourceError> {
        self.tracker.on_allocate()?;
        self.tracker.check_slot_count(shape.slot_count())?;
        let id = HeapId(self.objects.len());
        self.objects.push(PythonBasicObject::new(shape));
        Ok(id)
    }

    /// Returns a reference to an object.
    ///
    /// # Panics
    /// Panics if `id` was not allocated by this heap.
    #[must_use]
    pub fn get(&self, id: HeapId) -> &PythonBasicObject {
        self.objects.get(id.index()).expect("Heap::get: slot missing")
    }

    /// Returns a mutable reference to an object.
    ///
    /// # Panics
    /// Panics if `id` was not allocated by this heap.
    pub fn get_mut(&mut self, id: HeapId) -> &mut PythonBasicObject {
        self.objects.get_mut(id.index()).expect("Heap::get_mut: slot missing")
    }

    /// Moves an object to a shape that appends attributes to its current one.
    pub fn extend_object(&mut self, id: HeapId, shape: Rc<Shape>) -> Result<(), ResourceError> {
        self.tracker.check_slot_count(shape.slot_count())?;
        self.get_mut(id).extend(shape);
        Ok(())
    }

    /// Moves an object to a generalized shape, re-laying out its storage.
    pub fn migrate_object(&mut self, id: HeapId, shape: Rc<Shape>) {
        self.get_mut(id).migrate(shape);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[must_use]
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Returns a snapshot of object and slot counts.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let mut objects_by_shape = BTreeMap::new();
        let mut primitive_slots = 0;
        let mut object_slots = 0;
        for object in &self.objects {
            let shape = object.shape();
            *objects_by_shape.entry(shape.id()).or_insert(0) += 1;
            primitive_slots += shape.primitive_count();
            object_slots += shape.object_count();
        }
        HeapStats {
            live_objects: self.objects.len(),
            primitive_slots,
            object_slots,
            objects_by_shape,
            tracker_allocations: self.tracker.allocation_count(),
        }
    }
}
