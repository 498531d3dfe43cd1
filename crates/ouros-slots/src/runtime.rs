//! The state attribute call sites run against.

use crate::{
    exception::RunResult,
    heap::{Heap, HeapId, HeapStats},
    intern::{Interns, StringId},
    object::PythonBasicObject,
    resource::{NoLimitTracker, ResourceTracker},
    shape::{ShapeLayout, ShapeRegistry},
    tracer::{NoopTracer, StorageTracer},
    value::Value,
};

/// Everything attribute call sites operate on: the object heap, the shape registry, the
/// attribute name interner and the storage tracer.
///
/// Call sites ([`AttributeSetSite`](crate::AttributeSetSite),
/// [`AttributeGetSite`](crate::AttributeGetSite)) are owned by the code that executes them and
/// borrow the runtime for each execution.
#[derive(Debug)]
pub struct Runtime<T: ResourceTracker = NoLimitTracker, Tr: StorageTracer = NoopTracer> {
    pub(crate) heap: Heap<T>,
    pub(crate) shapes: ShapeRegistry,
    pub(crate) interns: Interns,
    pub(crate) tracer: Tr,
}

impl Runtime {
    /// Creates a runtime with no resource limits and no tracing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tracer(NoLimitTracker, NoopTracer)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ResourceTracker> Runtime<T, NoopTracer> {
    /// Creates a runtime enforcing the given resource tracker.
    #[must_use]
    pub fn with_tracker(tracker: T) -> Self {
        Self::with_tracer(tracker, NoopTracer)
    }
}

impl<T: ResourceTracker, Tr: StorageTracer> Runtime<T, Tr> {
    #[must_use]
    pub fn with_tracer(tracker: T, tracer: Tr) -> Self {
        Self {
            heap: Heap::new(16, tracker),
            shapes: ShapeRegistry::new(),
            interns: Interns::new(),
            tracer,
        }
    }

    /// Interns an attribute name.
    pub fn intern(&mut self, name: &str) -> StringId {
        self.interns.intern(name)
    }

    #[must_use]
    pub fn interns(&self) -> &Interns {
        &self.interns
    }

    /// Allocates an object with no attributes.
    pub fn allocate(&mut self) -> RunResult<HeapId> {
        let root = self.shapes.root();
        Ok(self.heap.allocate(root)?)
    }

    #[must_use]
    pub fn object(&self, id: HeapId) -> &PythonBasicObject {
        self.heap.get(id)
    }

    /// Loads an attribute without a call-site cache.
    #[must_use]
    pub fn get_attr(&self, id: HeapId, name: StringId) -> Option<Value> {
        self.heap.get(id).get_attr(name)
    }

    /// Describes the current layout of an object's shape.
    #[must_use]
    pub fn layout(&self, id: HeapId) -> ShapeLayout {
        self.heap.get(id).shape().layout(&self.interns)
    }

    #[must_use]
    pub fn heap(&self) -> &Heap<T> {
        &self.heap
    }

    #[must_use]
    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    #[must_use]
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    #[must_use]
    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    pub fn tracer_mut(&mut self) -> &mut Tr {
        &mut self.tracer
    }

    #[must_use]
    pub fn into_tracer(self) -> Tr {
        self.tracer
    }
}
