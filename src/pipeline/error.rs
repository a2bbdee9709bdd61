//! Stage-graph error types.

use crate::pipeline::id::{PortId, StageId};
use crate::pipeline::port::SignalType;
use thiserror::Error;

/// Errors that can occur while assembling or driving the stage graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Unknown stage {0:?}")]
    InvalidStage(StageId),

    #[error("Stage {stage:?} has no {direction} port {port}")]
    NoSuchPort {
        stage: StageId,
        direction: &'static str,
        port: u16,
    },

    #[error("Port mismatch: {from:?} carries {from_signal}, {to:?} expects {to_signal}")]
    PortMismatch {
        from: PortId,
        to: PortId,
        from_signal: SignalType,
        to_signal: SignalType,
    },

    #[error("Input {0:?} is already connected")]
    InputOccupied(PortId),

    #[error("Cycle detected in stage graph")]
    CycleDetected,

    #[error("Coefficient payload does not fit stage {stage:?} ({role})")]
    CoefficientMismatch { stage: StageId, role: &'static str },

    #[error("Topology is locked while streaming")]
    TopologyLocked,

    #[error("Stage graph is full ({0} stages)")]
    StageLimit(usize),

    #[error("Sink {0:?} is not fed by any source")]
    StarvedSink(StageId),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
