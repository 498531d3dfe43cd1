//! Attribute access call sites.
//!
//! A call site stands for one `obj.name = value` (or `obj.name`) in the program. It caches the
//! shape it last saw together with a node bound to that shape's location for `name`; as long
//! as the object passed in has the cached shape, execution is a pointer comparison plus the
//! node's typed write.
//!
//! # Write state machine
//!
//! ```text
//!   Uninitialized --first write--> Specialized(kind)
//!   Specialized(Int | Float | Boolean) --Generalize--> Specialized(Object)
//!   Specialized(Object)   (terminal: never generalizes again)
//! ```
//!
//! The Generalize signal returned by a node stops here: the site asks the
//! [`ShapeRegistry`](crate::ShapeRegistry) for the shape with an Object-kind slot, migrates the
//! object, replaces its node and retries the write. Callers of [`AttributeSetSite`] only ever
//! see resource errors.
//!
//! A shape guard miss (another object, or the same object after it gained attributes) just
//! resolves `name` again on the new shape. Once a site is Object-specialized it keeps that
//! state: objects still using a primitive slot for `name` are migrated to the generalized
//! shape before the write, and objects without `name` get it as an Object-kind slot.

use std::rc::Rc;

use crate::{
    exception::{ExcType, RunError, RunResult},
    heap::HeapId,
    intern::StringId,
    location::{Generalize, StorageKind, StorageLocation, WriteResult},
    node::{AttributeReadNode, AttributeWriteNode},
    resource::ResourceTracker,
    runtime::Runtime,
    shape::Shape,
    tracer::{StorageTracer, TransitionReason, WritePath},
    value::{Type, Value},
};

/// Observable specialization state of a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteState {
    Uninitialized,
    Specialized(StorageKind),
}

#[derive(Debug, Clone)]
struct Cached<N> {
    shape: Rc<Shape>,
    node: N,
}

/// Inline-cached attribute assignment.
#[derive(Debug, Clone)]
pub struct AttributeSetSite {
    name: StringId,
    cache: Option<Cached<AttributeWriteNode>>,
}

impl AttributeSetSite {
    #[must_use]
    pub fn new(name: StringId) -> Self {
        Self { name, cache: None }
    }

    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    #[must_use]
    pub fn state(&self) -> SiteState {
        match &self.cache {
            None => SiteState::Uninitialized,
            Some(cached) => SiteState::Specialized(cached.node.kind()),
        }
    }

    /// The currently cached write node, if any.
    #[must_use]
    pub fn node(&self) -> Option<AttributeWriteNode> {
        self.cache.as_ref().map(|cached| cached.node)
    }

    /// Assigns `value` to the attribute on `target`.
    ///
    /// A new attribute gets the slot kind matching `value`'s runtime type.
    pub fn execute<T: ResourceTracker, Tr: StorageTracer>(
        &mut self,
        rt: &mut Runtime<T, Tr>,
        target: HeapId,
        value: Value,
    ) -> RunResult<()> {
        let node = self.specialize(rt, target, StorageKind::for_value(&value))?;
        let result = node.set_value_unchecked(rt.heap.get_mut(target), value);
        self.complete(rt, target, node, result, WritePath::Generic)
    }

    /// Assigns an `int` without boxing when the cached node is Int-kind.
    pub fn execute_int<T: ResourceTracker, Tr: StorageTracer>(
        &mut self,
        rt: &mut Runtime<T, Tr>,
        target: HeapId,
        value: i64,
    ) -> RunResult<()> {
        let node = self.specialize(rt, target, StorageKind::Int)?;
        let path = match node {
            AttributeWriteNode::Int(_) => WritePath::Fast,
            _ => WritePath::Generic,
        };
        let result = node.set_int_value_unchecked(rt.heap.get_mut(target), value);
        self.complete(rt, target, node, result, path)
    }

    /// Assigns a `float` without boxing when the cached node is Float-kind.
    pub fn execute_double<T: ResourceTracker, Tr: StorageTracer>(
        &mut self,
        rt: &mut Runtime<T, Tr>,
        target: HeapId,
        value: f64,
    ) -> RunResult<()> {
        let node = self.specialize(rt, target, StorageKind::Float)?;
        let path = match node {
            AttributeWriteNode::Float(_) => WritePath::Fast,
            _ => WritePath::Generic,
        };
        let result = node.set_double_value_unchecked(rt.heap.get_mut(target), value);
        self.complete(rt, target, node, result, path)
    }

    /// Assigns a `bool` without boxing when the cached node is Boolean- or Int-kind.
    pub fn execute_bool<T: ResourceTracker, Tr: StorageTracer>(
        &mut self,
        rt: &mut Runtime<T, Tr>,
        target: HeapId,
        value: bool,
    ) -> RunResult<()> {
        let node = self.specialize(rt, target, StorageKind::Boolean)?;
        let path = match node {
            AttributeWriteNode::Boolean(_) | AttributeWriteNode::Int(_) => WritePath::Fast,
            _ => WritePath::Generic,
        };
        let result = node.set_boolean_value_unchecked(rt.heap.get_mut(target), value);
        self.complete(rt, target, node, result, path)
    }

    /// Returns the node for `target`'s current shape, re-specializing on a guard miss.
    ///
    /// `initial` is the slot kind used if the attribute does not exist yet, unless the site is
    /// already Object-specialized.
    fn specialize<T: ResourceTracker, Tr: StorageTracer>(
        &mut self,
        rt: &mut Runtime<T, Tr>,
        target: HeapId,
        initial: StorageKind,
    ) -> RunResult<AttributeWriteNode> {
        let shape = Rc::clone(rt.heap.get(target).shape());
        if let Some(cached) = &self.cache
            && Rc::ptr_eq(&cached.shape, &shape)
        {
            return Ok(cached.node);
        }

        let node = match shape.location(self.name) {
            Some(location)
                if location.kind().is_primitive() && self.state() == SiteState::Specialized(StorageKind::Object) =>
            {
                let (general, location) = rt.shapes.generalize(&shape, self.name);
                rt.heap.migrate_object(target, Rc::clone(&general));
                rt.tracer
                    .on_shape_transition(shape.id(), general.id(), TransitionReason::Generalize);
                self.install(&mut rt.tracer, general, location)
            }
            Some(location) => self.install(&mut rt.tracer, shape, location),
            None => {
                // an Object-specialized site adds new attributes as Object slots too
                let kind = if self.state() == SiteState::Specialized(StorageKind::Object) {
                    StorageKind::Object
                } else {
                    initial
                };
                let (extended, location) = rt.shapes.add_attribute(&shape, self.name, kind);
                rt.heap.extend_object(target, Rc::clone(&extended))?;
                rt.tracer
                    .on_shape_transition(shape.id(), extended.id(), TransitionReason::AddAttribute);
                self.install(&mut rt.tracer, extended, location)
            }
        };
        Ok(node)
    }

    fn install(
        &mut self,
        tracer: &mut impl StorageTracer,
        shape: Rc<Shape>,
        location: StorageLocation,
    ) -> AttributeWriteNode {
        let node = AttributeWriteNode::create(location);
        tracer.on_specialize(self.name, node.kind());
        self.cache = Some(Cached { shape, node });
        node
    }

    fn complete<T: ResourceTracker, Tr: StorageTracer>(
        &mut self,
        rt: &mut Runtime<T, Tr>,
        target: HeapId,
        node: AttributeWriteNode,
        result: WriteResult,
        path: WritePath,
    ) -> RunResult<()> {
        match result {
            Ok(()) => {
                rt.tracer.on_write(node.kind(), path);
                Ok(())
            }
            Err(signal) => self.generalize(rt, target, signal),
        }
    }

    /// Handles the Generalize signal: widen the slot, migrate the object, retry the write.
    fn generalize<T: ResourceTracker, Tr: StorageTracer>(
        &mut self,
        rt: &mut Runtime<T, Tr>,
        target: HeapId,
        signal: Generalize,
    ) -> RunResult<()> {
        rt.tracer.on_generalize(self.name, signal.location().kind());
        let shape = Rc::clone(rt.heap.get(target).shape());
        let (general, location) = rt.shapes.generalize(&shape, self.name);
        rt.heap.migrate_object(target, Rc::clone(&general));
        rt.tracer
            .on_shape_transition(shape.id(), general.id(), TransitionReason::Generalize);

        let node = self.install(&mut rt.tracer, general, location);
        match node.set_value_unchecked(rt.heap.get_mut(target), signal.into_value()) {
            Ok(()) => {
                rt.tracer.on_write(node.kind(), WritePath::Generic);
                Ok(())
            }
            Err(_) => Err(RunError::Internal("generalized attribute slot rejected a value".into())),
        }
    }
}

/// Inline-cached attribute load.
#[derive(Debug, Clone)]
pub struct AttributeGetSite {
    name: StringId,
    cache: Option<Cached<AttributeReadNode>>,
}

impl AttributeGetSite {
    #[must_use]
    pub fn new(name: StringId) -> Self {
        Self { name, cache: None }
    }

    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    #[must_use]
    pub fn state(&self) -> SiteState {
        match &self.cache {
            None => SiteState::Uninitialized,
            Some(cached) => SiteState::Specialized(cached.node.location().kind()),
        }
    }

    /// Loads the attribute, raising `AttributeError` if `target` doesn't have it.
    pub fn execute<T: ResourceTracker, Tr: StorageTracer>(
        &mut self,
        rt: &mut Runtime<T, Tr>,
        target: HeapId,
    ) -> RunResult<Value> {
        let node = self.specialize(rt, target)?;
        Ok(node.get_value_unchecked(rt.heap.get(target)))
    }

    /// Loads the attribute as an `int` without boxing; `None` if it holds another type.
    pub fn execute_int<T: ResourceTracker, Tr: StorageTracer>(
        &mut self,
        rt: &mut Runtime<T, Tr>,
        target: HeapId,
    ) -> RunResult<Option<i64>> {
        let node = self.specialize(rt, target)?;
        Ok(node.get_int_value_unchecked(rt.heap.get(target)))
    }

    /// Loads the attribute as a `float` without boxing; `None` if it holds another type.
    pub fn execute_double<T: ResourceTracker, Tr: StorageTracer>(
        &mut self,
        rt: &mut Runtime<T, Tr>,
        target: HeapId,
    ) -> RunResult<Option<f64>> {
        let node = self.specialize(rt, target)?;
        Ok(node.get_double_value_unchecked(rt.heap.get(target)))
    }

    /// Loads the attribute as a `bool` without boxing; `None` if it holds another type.
    pub fn execute_bool<T: ResourceTracker, Tr: StorageTracer>(
        &mut self,
        rt: &mut Runtime<T, Tr>,
        target: HeapId,
    ) -> RunResult<Option<bool>> {
        let node = self.specialize(rt, target)?;
        Ok(node.get_boolean_value_unchecked(rt.heap.get(target)))
    }

    fn specialize<T: ResourceTracker, Tr: StorageTracer>(
        &mut self,
        rt: &mut Runtime<T, Tr>,
        target: HeapId,
    ) -> RunResult<AttributeReadNode> {
        let shape = rt.heap.get(target).shape();
        if let Some(cached) = &self.cache
            && Rc::ptr_eq(&cached.shape, shape)
        {
            return Ok(cached.node);
        }
        // missing attributes are not cached, the next write will add them
        let Some(location) = shape.location(self.name) else {
            return Err(ExcType::attribute_error(Type::Object, rt.interns.get_str(self.name)));
        };
        let node = AttributeReadNode::create(location);
        self.cache = Some(Cached {
            shape: Rc::clone(shape),
            node,
        });
        rt.tracer.on_specialize(self.name, location.kind());
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        resource::{LimitedTracker, ResourceLimits},
        tracer::{RecordingTracer, StorageEvent},
    };

    #[test]
    fn first_write_specializes_by_value_type() {
        let mut rt = Runtime::new();
        let x = rt.intern("x");
        let obj = rt.allocate().unwrap();
        let mut site = AttributeSetSite::new(x);
        assert_eq!(site.state(), SiteState::Uninitialized);

        site.execute(&mut rt, obj, Value::Int(1)).unwrap();
        assert_eq!(site.state(), SiteState::Specialized(StorageKind::Int));
        assert_eq!(rt.get_attr(obj, x), Some(Value::Int(1)));
    }

    #[test]
    fn mismatch_generalizes_once() {
        let mut rt = Runtime::new();
        let x = rt.intern("x");
        let obj = rt.allocate().unwrap();
        let mut site = AttributeSetSite::new(x);

        site.execute_int(&mut rt, obj, 1).unwrap();
        site.execute(&mut rt, obj, Value::from("one")).unwrap();
        assert_eq!(site.state(), SiteState::Specialized(StorageKind::Object));
        assert_eq!(rt.get_attr(obj, x), Some(Value::from("one")));

        let shapes = rt.shapes().len();
        site.execute_int(&mut rt, obj, 2).unwrap();
        site.execute_double(&mut rt, obj, 2.5).unwrap();
        site.execute_bool(&mut rt, obj, true).unwrap();
        assert_eq!(rt.shapes().len(), shapes, "object-specialized site never generalizes again");
        assert_eq!(rt.get_attr(obj, x), Some(Value::Bool(true)));
    }

    #[test]
    fn object_site_migrates_objects_on_stale_shape() {
        let mut rt = Runtime::new();
        let x = rt.intern("x");
        let a = rt.allocate().unwrap();
        let b = rt.allocate().unwrap();

        let mut init = AttributeSetSite::new(x);
        init.execute_int(&mut rt, a, 1).unwrap();
        init.execute_int(&mut rt, b, 2).unwrap();
        let int_shape = Rc::clone(rt.object(b).shape());

        let mut site = AttributeSetSite::new(x);
        site.execute(&mut rt, a, Value::None).unwrap();
        assert_eq!(site.state(), SiteState::Specialized(StorageKind::Object));
        assert!(Rc::ptr_eq(rt.object(b).shape(), &int_shape), "b is untouched until written");

        site.execute_int(&mut rt, b, 3).unwrap();
        assert_eq!(site.state(), SiteState::Specialized(StorageKind::Object));
        assert!(Rc::ptr_eq(rt.object(a).shape(), rt.object(b).shape()));
        assert_eq!(rt.get_attr(b, x), Some(Value::Int(3)));
    }

    #[test]
    fn slot_limit_surfaces_as_memory_error() {
        let mut rt = Runtime::with_tracker(LimitedTracker::new(ResourceLimits::new().max_slots_per_object(1)));
        let (x, y) = (rt.intern("x"), rt.intern("y"));
        let obj = rt.allocate().unwrap();
        AttributeSetSite::new(x).execute_int(&mut rt, obj, 1).unwrap();

        let mut site = AttributeSetSite::new(y);
        let err = site.execute_int(&mut rt, obj, 2).unwrap_err();
        assert_eq!(err.exc_type(), Some(ExcType::MemoryError));
        assert_eq!(site.state(), SiteState::Uninitialized);
        assert_eq!(rt.get_attr(obj, y), None);
    }

    #[test]
    fn get_site_caches_and_raises_attribute_error() {
        let mut rt = Runtime::new();
        let x = rt.intern("x");
        let obj = rt.allocate().unwrap();
        let mut get = AttributeGetSite::new(x);

        let err = get.execute(&mut rt, obj).unwrap_err();
        assert_eq!(err.to_string(), "AttributeError: 'object' object has no attribute 'x'");
        assert_eq!(get.state(), SiteState::Uninitialized);

        AttributeSetSite::new(x).execute_double(&mut rt, obj, 0.25).unwrap();
        assert_eq!(get.execute_double(&mut rt, obj).unwrap(), Some(0.25));
        assert_eq!(get.state(), SiteState::Specialized(StorageKind::Float));
        assert_eq!(get.execute_int(&mut rt, obj).unwrap(), None);
        assert_eq!(get.execute(&mut rt, obj).unwrap(), Value::Float(0.25));
    }

    #[test]
    fn tracer_sees_generalization_sequence() {
        let mut rt = Runtime::with_tracer(crate::resource::NoLimitTracker, RecordingTracer::new());
        let x = rt.intern("x");
        let obj = rt.allocate().unwrap();
        let mut site = AttributeSetSite::new(x);
        site.execute_double(&mut rt, obj, 1.0).unwrap();
        let float_shape = rt.object(obj).shape().id();
        site.execute(&mut rt, obj, Value::from("s")).unwrap();

        let root = rt.shapes().root().id();
        let events = rt.into_tracer().into_events();
        assert_eq!(events.len(), 7);
        assert_eq!(
            events[0],
            StorageEvent::ShapeTransition {
                from: root,
                to: float_shape,
                reason: TransitionReason::AddAttribute,
            }
        );
        assert_eq!(
            events[1],
            StorageEvent::Specialize {
                name: x,
                kind: StorageKind::Float,
            }
        );
        assert_eq!(
            events[2],
            StorageEvent::Write {
                kind: StorageKind::Float,
                path: WritePath::Fast,
            }
        );
        assert_eq!(
            events[3],
            StorageEvent::Generalize {
                name: x,
                from: StorageKind::Float,
            }
        );
        assert!(matches!(
            events[4],
            StorageEvent::ShapeTransition {
                reason: TransitionReason::Generalize,
                ..
            }
        ));
        assert_eq!(
            events[5],
            StorageEvent::Specialize {
                name: x,
                kind: StorageKind::Object,
            }
        );
        assert_eq!(
            events[6],
            StorageEvent::Write {
                kind: StorageKind::Object,
                path: WritePath::Generic,
            }
        );
    }
}
