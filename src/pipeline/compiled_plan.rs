//! What the compiler learned about the wired graph.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::id::StageId;

/// The stages that carry signal, and the sinks that would hear nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledPlan {
    /// Stages on a source-to-sink path, upstream first.
    pub order: Vec<StageId>,
    /// Sinks no source reaches.
    pub starved_sinks: Vec<StageId>,
    /// Stages that exist but carry nothing in this topology.
    pub idle_stages: usize,
    pub generation: u64,
}

impl CompiledPlan {
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn carries(&self, id: StageId) -> bool {
        self.order.contains(&id)
    }

    /// Fails on the first sink that would receive no samples.
    pub fn verify(&self) -> PipelineResult<()> {
        match self.starved_sinks.first() {
            Some(&sink) => Err(PipelineError::StarvedSink(sink)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_reports_first_starved_sink() {
        let plan = CompiledPlan {
            order: vec![StageId(0), StageId(1)],
            starved_sinks: vec![StageId(4), StageId(2)],
            ..CompiledPlan::default()
        };
        assert_eq!(plan.verify(), Err(PipelineError::StarvedSink(StageId(4))));
        assert!(plan.carries(StageId(1)));
        assert!(!plan.carries(StageId(4)));
    }

    #[test]
    fn test_empty_plan_verifies() {
        assert_eq!(CompiledPlan::default().verify(), Ok(()));
    }
}
