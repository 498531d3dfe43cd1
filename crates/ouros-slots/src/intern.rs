//! Attribute name interning.
//!
//! Shapes key their attribute tables by [`StringId`] rather than by string so that shape
//! lookups and transition memoization compare 4-byte integers. The interner is owned by the
//! [`Runtime`](crate::Runtime); lookups back to text are only needed for error messages,
//! layout dumps and tracing.

use ahash::AHashMap;

/// Index into the string interner's storage.
///
/// Uses `u32` to save space (4 bytes vs 8 bytes for `usize`). This limits us to
/// ~4 billion unique interns, which is more than sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, serde::Serialize, serde::Deserialize)]
pub struct StringId(u32);

impl StringId {
    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interner for attribute names.
#[derive(Debug, Default)]
pub struct Interns {
    strings: Vec<Box<str>>,
    lookup: AHashMap<Box<str>, StringId>,
}

impl Interns {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `name`, returning the existing id if it was seen before.
    pub fn intern(&mut self, name: &str) -> StringId {
        if let Some(&id) = self.lookup.get(name) {
            return id;
        }
        let id = StringId(u32::try_from(self.strings.len()).expect("string interner overflow"));
        self.strings.push(name.into());
        self.lookup.insert(name.into(), id);
        id
    }

    /// Returns the id for `name` without interning it.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<StringId> {
        self.lookup.get(name).copied()
    }

    /// Returns the text for an interned id.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this interner.
    #[must_use]
    pub fn get_str(&self, id: StringId) -> &str {
        &self.strings[id.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
