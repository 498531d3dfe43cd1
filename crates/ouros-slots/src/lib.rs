#![doc = include_str!("../../../README.md")]
#![cfg_attr(test, expect(clippy::approx_constant, reason = "fixtures use literal decimal values"))]
mod exception;
mod heap;
mod intern;
mod location;
mod node;
mod object;
mod resource;
mod runtime;
mod shape;
mod site;
mod tracer;
mod value;

pub use crate::{
    exception::{ExcType, RunError, RunResult, SimpleException},
    heap::{Heap, HeapId, HeapStats},
    intern::{Interns, StringId},
    location::{Generalize, StorageKind, StorageLocation, WriteResult},
    node::{AttributeReadNode, AttributeWriteNode},
    object::PythonBasicObject,
    resource::{LimitedTracker, NoLimitTracker, ResourceError, ResourceLimits, ResourceTracker},
    runtime::Runtime,
    shape::{AttributeLayout, Shape, ShapeId, ShapeLayout, ShapeRegistry},
    site::{AttributeGetSite, AttributeSetSite, SiteState},
    tracer::{
        NoopTracer, ProfilingReport, ProfilingTracer, RecordingTracer, StderrTracer, StorageEvent, StorageTracer,
        TransitionReason, WritePath,
    },
    value::{Type, Value},
};
