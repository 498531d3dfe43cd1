//! Attribute storage tracing infrastructure.
//!
//! Provides a trait-based tracing system for attribute call sites with zero-cost abstraction.
//! When using [`NoopTracer`], all trace methods compile away entirely via monomorphization,
//! the same way [`NoLimitTracker`](crate::NoLimitTracker) eliminates resource checking.
//!
//! # Architecture
//!
//! The [`StorageTracer`] trait defines hook points at the events that matter for storage
//! specialization: a call site (re)specializing, a slot being generalized, an object moving to
//! another shape, and each completed write. Concrete implementations collect different data:
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`StderrTracer`] | Human-readable storage log to stderr |
//! | [`ProfilingTracer`] | Write counters per kind and path, generalization counts |
//! | [`RecordingTracer`] | Full event recording for post-mortem analysis |
//!
//! # Usage
//!
//! The runtime is parameterized as `Runtime<T: ResourceTracker, Tr: StorageTracer>`:
//!
//! ```ignore
//! // Production (zero overhead):
//! let mut rt = Runtime::new();
//!
//! // Profiling:
//! let mut rt = Runtime::with_tracer(NoLimitTracker, ProfilingTracer::new());
//! // ... run ...
//! println!("{}", rt.tracer().report());
//! ```

use std::fmt;

use strum::{Display, IntoStaticStr};

use crate::{intern::StringId, location::StorageKind, shape::ShapeId};

/// Which write entry completed a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum WritePath {
    /// A typed entry that matched its node and skipped boxing.
    Fast,
    /// The generic entry, or a typed entry that boxed its value.
    Generic,
}

/// Why an object moved from one shape to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum TransitionReason {
    AddAttribute,
    Generalize,
}

/// Trace event emitted by attribute call sites.
///
/// Used by [`RecordingTracer`] to capture a full storage trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    /// A call site installed a node of `kind` for attribute `name`.
    Specialize { name: StringId, kind: StorageKind },
    /// A slot of kind `from` rejected a value and attribute `name` was widened.
    Generalize { name: StringId, from: StorageKind },
    /// An object moved between shapes.
    ShapeTransition {
        from: ShapeId,
        to: ShapeId,
        reason: TransitionReason,
    },
    /// A write completed.
    Write { kind: StorageKind, path: WritePath },
}

/// Trait for attribute storage tracing.
///
/// All methods have default no-op implementations, so [`NoopTracer`] requires
/// zero lines of code and compiles to zero instructions. Implementations only
/// override the hooks they care about.
pub trait StorageTracer: fmt::Debug {
    /// Called when a call site caches a new write or read node.
    #[inline(always)]
    fn on_specialize(&mut self, _name: StringId, _kind: StorageKind) {}

    /// Called when a write to a slot of kind `from` returned the Generalize signal.
    #[inline(always)]
    fn on_generalize(&mut self, _name: StringId, _from: StorageKind) {}

    /// Called when an object moves to another shape.
    #[inline(always)]
    fn on_shape_transition(&mut self, _from: ShapeId, _to: ShapeId, _reason: TransitionReason) {}

    /// Called after every successful attribute write.
    ///
    /// This is the hottest hook. Implementations should be as lightweight as possible.
    #[inline(always)]
    fn on_write(&mut self, _kind: StorageKind, _path: WritePath) {}
}

// ============================================================================
// NoopTracer: zero-cost production default
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl StorageTracer for NoopTracer {}

// ============================================================================
// StderrTracer: human-readable storage log
// ============================================================================

/// Tracer that prints a human-readable storage log to stderr.
///
/// Output format:
/// ```text
///   +++ SPECIALIZE attr#0  Int
///   ... WRITE Int          Fast
///   !!! GENERALIZE attr#0  from Int
///   --> shape#1 -> shape#3 (Generalize)
/// ```
///
/// Writes are the noisiest events, so they are only printed when `with_writes` is used.
#[derive(Debug, Default)]
pub struct StderrTracer {
    /// Whether individual writes are logged.
    writes: bool,
    /// Maximum number of lines to print before stopping. None = unlimited.
    limit: Option<usize>,
    /// Number of lines printed so far.
    count: usize,
}

impl StderrTracer {
    /// Creates a tracer logging specialization and shape events only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracer that also logs every write.
    #[must_use]
    pub fn with_writes() -> Self {
        Self {
            writes: true,
            ..Self::default()
        }
    }

    /// Stops logging after `limit` lines.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn emit(&mut self, line: fmt::Arguments<'_>) {
        if self.limit.is_some_and(|limit| self.count >= limit) {
            return;
        }
        eprintln!("{line}");
        self.count += 1;
        if self.limit == Some(self.count) {
            eprintln!("--- trace limit reached ({} lines) ---", self.count);
        }
    }
}

impl StorageTracer for StderrTracer {
    fn on_specialize(&mut self, name: StringId, kind: StorageKind) {
        self.emit(format_args!("  +++ SPECIALIZE attr#{:<4} {kind}", name.index()));
    }

    fn on_generalize(&mut self, name: StringId, from: StorageKind) {
        self.emit(format_args!("  !!! GENERALIZE attr#{:<4} from {from}", name.index()));
    }

    fn on_shape_transition(&mut self, from: ShapeId, to: ShapeId, reason: TransitionReason) {
        self.emit(format_args!("  --> {from} -> {to} ({reason})"));
    }

    fn on_write(&mut self, kind: StorageKind, path: WritePath) {
        if self.writes {
            self.emit(format_args!("  ... WRITE {kind:<10} {path}"));
        }
    }
}

// ============================================================================
// ProfilingTracer: write counters
// ============================================================================

/// Tracer that collects storage statistics.
///
/// Tracks writes per slot kind and path, and how often call sites specialize, generalize and
/// move objects between shapes. Retrieve results via [`ProfilingTracer::report`].
#[derive(Debug, Default)]
pub struct ProfilingTracer {
    /// Writes indexed by `[kind][path]`.
    writes: [[u64; 2]; 4],
    specializations: u64,
    generalizations: u64,
    transitions: u64,
}

/// Summary report from a profiling trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilingReport {
    /// `(kind, fast writes, generic writes)` for every kind that saw a write.
    pub writes: Vec<(StorageKind, u64, u64)>,
    pub total_writes: u64,
    pub specializations: u64,
    pub generalizations: u64,
    pub transitions: u64,
}

const KINDS: [StorageKind; 4] = [StorageKind::Object, StorageKind::Int, StorageKind::Float, StorageKind::Boolean];

fn kind_slot(kind: StorageKind) -> usize {
    match kind {
        StorageKind::Object => 0,
        StorageKind::Int => 1,
        StorageKind::Float => 2,
        StorageKind::Boolean => 3,
    }
}

impl ProfilingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a report from the collected counters.
    #[must_use]
    pub fn report(&self) -> ProfilingReport {
        let writes: Vec<_> = KINDS
            .iter()
            .map(|&kind| {
                let [fast, generic] = self.writes[kind_slot(kind)];
                (kind, fast, generic)
            })
            .filter(|&(_, fast, generic)| fast + generic > 0)
            .collect();
        ProfilingReport {
            total_writes: writes.iter().map(|&(_, fast, generic)| fast + generic).sum(),
            writes,
            specializations: self.specializations,
            generalizations: self.generalizations,
            transitions: self.transitions,
        }
    }
}

impl StorageTracer for ProfilingTracer {
    fn on_specialize(&mut self, _name: StringId, _kind: StorageKind) {
        self.specializations += 1;
    }

    fn on_generalize(&mut self, _name: StringId, _from: StorageKind) {
        self.generalizations += 1;
    }

    fn on_shape_transition(&mut self, _from: ShapeId, _to: ShapeId, _reason: TransitionReason) {
        self.transitions += 1;
    }

    #[inline]
    fn on_write(&mut self, kind: StorageKind, path: WritePath) {
        let column = match path {
            WritePath::Fast => 0,
            WritePath::Generic => 1,
        };
        self.writes[kind_slot(kind)][column] += 1;
    }
}

impl fmt::Display for ProfilingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Storage Profiling Report ===")?;
        writeln!(f, "Total writes:       {}", self.total_writes)?;
        writeln!(f, "Specializations:    {}", self.specializations)?;
        writeln!(f, "Generalizations:    {}", self.generalizations)?;
        writeln!(f, "Shape transitions:  {}", self.transitions)?;
        writeln!(f)?;
        writeln!(f, "--- Writes by kind ---")?;
        for (kind, fast, generic) in &self.writes {
            let pct = (*fast as f64 / (*fast + *generic) as f64) * 100.0;
            writeln!(f, "  {kind:<10} fast={fast:>8} generic={generic:>8}  ({pct:>5.1}% fast)")?;
        }
        Ok(())
    }
}

// ============================================================================
// RecordingTracer: full event recording
// ============================================================================

/// Tracer that records all events for post-mortem analysis.
///
/// This is the most expensive tracer (allocates per event), so use it only for debugging
/// specific issues or recording short executions.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<StorageEvent>,
    /// Optional limit on number of events recorded.
    limit: Option<usize>,
    /// Whether write events are recorded.
    writes: bool,
}

impl RecordingTracer {
    /// Creates a recording tracer that records every event, writes included.
    #[must_use]
    pub fn new() -> Self {
        Self {
            writes: true,
            ..Self::default()
        }
    }

    /// Creates a recording tracer that skips write events.
    #[must_use]
    pub fn without_writes() -> Self {
        Self::default()
    }

    /// Stops recording after `limit` events.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn events(&self) -> &[StorageEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<StorageEvent> {
        self.events
    }

    fn record(&mut self, event: StorageEvent) {
        if self.limit.is_some_and(|l| self.events.len() >= l) {
            return;
        }
        self.events.push(event);
    }
}

impl StorageTracer for RecordingTracer {
    fn on_specialize(&mut self, name: StringId, kind: StorageKind) {
        self.record(StorageEvent::Specialize { name, kind });
    }

    fn on_generalize(&mut self, name: StringId, from: StorageKind) {
        self.record(StorageEvent::Generalize { name, from });
    }

    fn on_shape_transition(&mut self, from: ShapeId, to: ShapeId, reason: TransitionReason) {
        self.record(StorageEvent::ShapeTransition { from, to, reason });
    }

    fn on_write(&mut self, kind: StorageKind, path: WritePath) {
        if self.writes {
            self.record(StorageEvent::Write { kind, path });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiling_report_counts_by_kind_and_path() {
        let mut tracer = ProfilingTracer::new();
        tracer.on_write(StorageKind::Int, WritePath::Fast);
        tracer.on_write(StorageKind::Int, WritePath::Fast);
        tracer.on_write(StorageKind::Int, WritePath::Generic);
        tracer.on_write(StorageKind::Object, WritePath::Generic);
        tracer.on_generalize(StringId::default(), StorageKind::Int);

        let report = tracer.report();
        assert_eq!(
            report.writes,
            vec![(StorageKind::Object, 0, 1), (StorageKind::Int, 2, 1)]
        );
        assert_eq!(report.total_writes, 4);
        assert_eq!(report.generalizations, 1);
        assert!(report.to_string().contains("Generalizations:    1"));
    }

    #[test]
    fn recording_tracer_honors_limit_and_write_filter() {
        let mut tracer = RecordingTracer::without_writes().with_limit(1);
        tracer.on_write(StorageKind::Float, WritePath::Fast);
        tracer.on_specialize(StringId::default(), StorageKind::Float);
        tracer.on_specialize(StringId::default(), StorageKind::Object);
        assert_eq!(
            tracer.into_events(),
            vec![StorageEvent::Specialize {
                name: StringId::default(),
                kind: StorageKind::Float,
            }]
        );
    }
}
