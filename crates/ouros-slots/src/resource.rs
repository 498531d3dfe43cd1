//! Resource limits for the object heap.

use std::fmt;

/// Error returned when a resource limit is exceeded while allocating objects or growing
/// their attribute storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// Maximum number of object allocations exceeded.
    Allocation { limit: usize, count: usize },
    /// Maximum number of attribute slots on a single object exceeded.
    Slots { limit: usize, requested: usize },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation { limit, count } => {
                write!(f, "allocation limit exceeded: {count} > {limit}")
            }
            Self::Slots { limit, requested } => {
                write!(f, "attribute slot limit exceeded: {requested} > {limit}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// Trait for tracking resource usage of the object heap.
///
/// The heap is generic over its tracker, so [`NoLimitTracker`] compiles every check away and
/// [`LimitedTracker`] enforces a configured [`ResourceLimits`].
pub trait ResourceTracker: fmt::Debug {
    /// Called before each object allocation.
    ///
    /// Returns `Ok(())` if the allocation should proceed, or `Err(ResourceError)`
    /// if a limit would be exceeded.
    fn on_allocate(&mut self) -> Result<(), ResourceError>;

    /// Called before an object's storage grows to `slot_count` slots.
    fn check_slot_count(&self, slot_count: usize) -> Result<(), ResourceError>;

    /// Returns the total number of allocations tracked, if this tracker records them.
    ///
    /// `LimitedTracker` returns `Some(count)`; `NoLimitTracker` returns `None`.
    fn allocation_count(&self) -> Option<usize> {
        None
    }
}

/// A resource tracker that never rejects anything.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct NoLimitTracker;

impl ResourceTracker for NoLimitTracker {
    #[inline]
    fn on_allocate(&mut self) -> Result<(), ResourceError> {
        Ok(())
    }

    #[inline]
    fn check_slot_count(&self, _slot_count: usize) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// Configuration for resource limits.
///
/// All limits are optional - set to `None` to disable a specific limit.
/// Use `ResourceLimits::default()` for no limits, or build custom limits
/// with the builder pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of objects allocated on the heap.
    pub max_allocations: Option<usize>,
    /// Maximum number of attribute slots (primitive plus object) on a single object.
    pub max_slots_per_object: Option<usize>,
}

impl ResourceLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of allocations.
    #[must_use]
    pub fn max_allocations(mut self, limit: usize) -> Self {
        self.max_allocations = Some(limit);
        self
    }

    /// Sets the maximum number of attribute slots per object.
    #[must_use]
    pub fn max_slots_per_object(mut self, limit: usize) -> Self {
        self.max_slots_per_object = Some(limit);
        self
    }
}

/// A resource tracker that enforces configurable limits.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LimitedTracker {
    limits: ResourceLimits,
    /// Total number of allocations made.
    allocation_count: usize,
}

impl LimitedTracker {
    /// Creates a new LimitedTracker with the given limits.
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            allocation_count: 0,
        }
    }

    #[must_use]
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }
}

impl ResourceTracker for LimitedTracker {
    fn on_allocate(&mut self) -> Result<(), ResourceError> {
        if let Some(max) = self.limits.max_allocations
            && self.allocation_count >= max
        {
            return Err(ResourceError::Allocation {
                limit: max,
                count: self.allocation_count + 1,
            });
        }
        self.allocation_count += 1;
        Ok(())
    }

    fn check_slot_count(&self, slot_count: usize) -> Result<(), ResourceError> {
        match self.limits.max_slots_per_object {
            Some(max) if slot_count > max => Err(ResourceError::Slots {
                limit: max,
                requested: slot_count,
            }),
            _ => Ok(()),
        }
    }

    fn allocation_count(&self) -> Option<usize> {
        Some(self.allocation_count)
    }
}
