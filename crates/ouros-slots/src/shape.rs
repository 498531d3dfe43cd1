//! Shapes (hidden classes) and the registry that owns them.
//!
//! Objects with the same attributes, added in the same order with the same slot kinds, share
//! one immutable [`Shape`]. Shapes form a transition graph rooted at the empty shape:
//!
//! ```text
//!        {}
//!         |  add x: Int
//!     {x: Int}
//!         |  add y: Object
//!  {x: Int, y: Object} --- generalize x ---> {x: Object, y: Object}
//! ```
//!
//! Both kinds of transition are memoized by the [`ShapeRegistry`], so every object that takes
//! the same path ends up sharing the same `Rc<Shape>`, and a generalized shape is created once
//! no matter how many objects or call sites trigger it.
//!
//! Shapes are never mutated after they are published. Generalizing an attribute produces a new
//! shape with a fresh Object-kind location; objects still on the old shape keep a consistent
//! layout and stay valid.

use std::{fmt, rc::Rc};

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::{
    intern::{Interns, StringId},
    location::{StorageKind, StorageLocation},
};

/// Identifier of a shape inside its [`ShapeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ShapeId(u32);

impl ShapeId {
    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape#{}", self.0)
    }
}

/// Immutable layout descriptor shared by every object with the same attribute set.
#[derive(Debug)]
pub struct Shape {
    id: ShapeId,
    /// Attribute locations in insertion order.
    attributes: IndexMap<StringId, StorageLocation, ahash::RandomState>,
    /// Number of slots in the unboxed primitive array.
    primitive_count: u32,
    /// Number of slots in the boxed object array.
    object_count: u32,
}

impl Shape {
    #[inline]
    #[must_use]
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Returns the location of `name` in this layout.
    #[inline]
    #[must_use]
    pub fn location(&self, name: StringId) -> Option<StorageLocation> {
        self.attributes.get(&name).copied()
    }

    /// Iterates the attributes in the order they were added.
    pub fn attributes(&self) -> impl Iterator<Item = (StringId, StorageLocation)> + '_ {
        self.attributes.iter().map(|(&name, &location)| (name, location))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    #[must_use]
    pub fn primitive_count(&self) -> usize {
        self.primitive_count as usize
    }

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.object_count as usize
    }

    /// Total number of storage slots an object with this shape needs.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.primitive_count() + self.object_count()
    }

    /// Describes this layout with attribute names resolved, for debugging dumps.
    #[must_use]
    pub fn layout(&self, interns: &Interns) -> ShapeLayout {
        ShapeLayout {
            id: self.id,
            attributes: self
                .attributes()
                .map(|(name, location)| AttributeLayout {
                    name: interns.get_str(name).to_owned(),
                    kind: location.kind(),
                    index: location.index(),
                })
                .collect(),
            primitive_slots: self.primitive_count(),
            object_slots: self.object_count(),
        }
    }
}

/// Serializable description of a shape's layout.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ShapeLayout {
    pub id: ShapeId,
    pub attributes: Vec<AttributeLayout>,
    pub primitive_slots: usize,
    pub object_slots: usize,
}

/// One attribute entry of a [`ShapeLayout`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttributeLayout {
    pub name: String,
    pub kind: StorageKind,
    pub index: usize,
}

impl ShapeLayout {
    /// Renders the layout as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Edge in the shape transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Transition {
    /// Append a new attribute with the given slot kind.
    Add(StringId, StorageKind),
    /// Widen an existing attribute to an Object-kind slot.
    Generalize(StringId),
}

/// Owner of every shape, and the memo table of transitions between them.
///
/// The registry is the single logical owner of shapes; objects and cached nodes hold `Rc`
/// clones. Transitions are looked up by `(from, edge)` so repeated attribute additions and
/// generalizations return the same shape.
#[derive(Debug)]
pub struct ShapeRegistry {
    shapes: Vec<Rc<Shape>>,
    transitions: AHashMap<(ShapeId, Transition), (ShapeId, StorageLocation)>,
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeRegistry {
    /// Creates a registry holding only the empty root shape.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            shapes: Vec::new(),
            transitions: AHashMap::new(),
        };
        registry.push(IndexMap::default(), 0, 0);
        registry
    }

    /// The empty shape every new object starts with.
    #[must_use]
    pub fn root(&self) -> Rc<Shape> {
        Rc::clone(&self.shapes[0])
    }

    #[must_use]
    pub fn get(&self, id: ShapeId) -> Option<&Rc<Shape>> {
        self.shapes.get(id.index())
    }

    /// Number of shapes created so far, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Returns the shape reached from `shape` by appending `name` with a slot of `kind`.
    ///
    /// Existing slot indices are preserved, so objects move to the returned shape by growing
    /// their storage. If `shape` already has `name`, it is returned unchanged with its
    /// existing location.
    pub fn add_attribute(
        &mut self,
        shape: &Rc<Shape>,
        name: StringId,
        kind: StorageKind,
    ) -> (Rc<Shape>, StorageLocation) {
        if let Some(location) = shape.location(name) {
            return (Rc::clone(shape), location);
        }
        let key = (shape.id(), Transition::Add(name, kind));
        if let Some(&(id, location)) = self.transitions.get(&key) {
            return (Rc::clone(&self.shapes[id.index()]), location);
        }

        let mut attributes = shape.attributes.clone();
        let mut primitive_count = shape.primitive_count;
        let mut object_count = shape.object_count;
        let location = if kind.is_primitive() {
            primitive_count += 1;
            StorageLocation::new(kind, primitive_count - 1)
        } else {
            object_count += 1;
            StorageLocation::new(kind, object_count - 1)
        };
        attributes.insert(name, location);

        let next = self.push(attributes, primitive_count, object_count);
        self.transitions.insert(key, (next.id(), location));
        (next, location)
    }

    /// Returns the shape in which `name` is stored in an Object-kind slot.
    ///
    /// Every other attribute keeps its kind; slot indices are recomputed, so objects move to
    /// the returned shape with [`PythonBasicObject::migrate`](crate::PythonBasicObject::migrate).
    /// If `name` is already Object-kind, `shape` itself is returned; if `name` is absent it is
    /// added as an Object-kind attribute.
    pub fn generalize(&mut self, shape: &Rc<Shape>, name: StringId) -> (Rc<Shape>, StorageLocation) {
        let Some(current) = shape.location(name) else {
            return self.add_attribute(shape, name, StorageKind::Object);
        };
        if current.kind() == StorageKind::Object {
            return (Rc::clone(shape), current);
        }
        let key = (shape.id(), Transition::Generalize(name));
        if let Some(&(id, location)) = self.transitions.get(&key) {
            return (Rc::clone(&self.shapes[id.index()]), location);
        }

        let mut attributes = IndexMap::with_capacity_and_hasher(shape.len(), ahash::RandomState::default());
        let mut primitive_count = 0;
        let mut object_count = 0;
        for (attr, location) in shape.attributes() {
            let kind = if attr == name { StorageKind::Object } else { location.kind() };
            let slot = if kind.is_primitive() {
                primitive_count += 1;
                primitive_count - 1
            } else {
                object_count += 1;
                object_count - 1
            };
            attributes.insert(attr, StorageLocation::new(kind, slot));
        }
        let location = attributes[&name];

        let next = self.push(attributes, primitive_count, object_count);
        self.transitions.insert(key, (next.id(), location));
        (next, location)
    }

    fn push(
        &mut self,
        attributes: IndexMap<StringId, StorageLocation, ahash::RandomState>,
        primitive_count: u32,
        object_count: u32,
    ) -> Rc<Shape> {
        let id = ShapeId(u32::try_from(self.shapes.len()).expect("shape registry overflow"));
        let shape = Rc::new(Shape {
            id,
            attributes,
            primitive_count,
            object_count,
        });
        self.shapes.push(Rc::clone(&shape));
        shape
    }
}
