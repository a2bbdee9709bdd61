//! Stage graph for the receive signal path.
//!
//! Stages are opaque DSP units with typed ports. The graph validates wiring,
//! locks topology while streaming, and lets coefficients change in place.
//!
//! # Architecture
//!
//! ```text
//! [Source] ──► [Resample] ──► [Translate] ──► ... ──► [Volume] ──► [AudioSink]
//!     └──► [LogPowerFft] ──► [SpectrumProbe]
//! ```
//!
//! # Design
//!
//! - **Stable identity**: `StageId` indexes the stage vector; stages are never removed.
//! - **Typed ports**: connections must join matching `SignalType`s.
//! - **Streaming gate**: workers enter/leave a `StreamGate`; `wait` drains them.
//! - **Dedicated control context**: `RadioBridge` carries commands in and events out.

pub mod bridge;
pub mod compiled_plan;
pub mod compiler;
pub mod error;
pub mod graph;
pub mod id;
pub mod port;
pub mod stage;

pub use bridge::{
    EdgeSnapshot, RadioBridge, RadioCommand, RadioEvent, StageSnapshot, TopologySnapshot,
};
pub use compiled_plan::CompiledPlan;
pub use error::{PipelineError, PipelineResult};
pub use graph::{Edge, FlowGraph, StreamGate, WorkGuard};
pub use id::{EdgeId, PortId, StageId};
pub use port::{PortDescriptor, PortDirection, SignalType};
pub use stage::{Coefficients, DesignWindow, FilterDesign, FilterResponse, Stage, StageRole};
