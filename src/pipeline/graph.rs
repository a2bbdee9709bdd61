//! The stage graph: storage, wiring, and the streaming gate.
//!
//! `FlowGraph` owns every stage and every edge. Wiring rules:
//! 1. An edge joins the `n`th output of one stage to the `n`th input of another.
//! 2. Both ends must carry the same `SignalType`.
//! 3. An input accepts one edge; outputs fan out freely.
//! 4. The topology is frozen while streaming. Coefficients are not.
//!
//! Streaming workers hold a `StreamGate` and wrap each unit of work in a
//! `WorkGuard`. `wait` returns once no guard is outstanding, which is what
//! "drained" means for a rebuild.

use crate::pipeline::compiled_plan::CompiledPlan;
use crate::pipeline::compiler::PlanCompiler;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::id::{EdgeId, PortId, StageId};
use crate::pipeline::port::{nth_port, PortDirection};
use crate::pipeline::stage::{Coefficients, Stage, StageRole};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// An edge connecting an output port of one stage to an input port of another.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub from: PortId,
    pub to: PortId,
}

/// Shared view of the streaming state handed to worker threads.
#[derive(Debug, Clone)]
pub struct StreamGate {
    streaming: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
}

impl StreamGate {
    fn new() -> Self {
        Self {
            streaming: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.streaming.load(Ordering::Acquire)
    }

    /// Begin a unit of work. Returns `None` when the graph is not streaming.
    pub fn enter(&self) -> Option<WorkGuard> {
        if !self.is_open() {
            return None;
        }
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        // stop() may have landed between the check and the increment
        if !self.is_open() {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            return None;
        }
        Some(WorkGuard {
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Marks one in-flight unit of streaming work; released on drop.
#[derive(Debug)]
pub struct WorkGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// The stage graph.
pub struct FlowGraph {
    stages: Vec<Stage>,
    edges: Vec<Edge>,
    stage_limit: usize,
    /// Cached compiled plan
    compiled_plan: CompiledPlan,
    /// Generation counter for cache invalidation
    generation: u64,
    /// Whether plan needs recompilation
    compiled_plan_dirty: bool,
    gate: StreamGate,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            edges: Vec::new(),
            stage_limit: PortId::MAX_STAGES,
            compiled_plan: CompiledPlan::default(),
            generation: 0,
            compiled_plan_dirty: true,
            gate: StreamGate::new(),
        }
    }

    /// A graph that refuses stages past `limit`.
    #[cfg(test)]
    fn with_stage_limit(limit: usize) -> Self {
        Self {
            stage_limit: limit.min(PortId::MAX_STAGES),
            ..Self::new()
        }
    }

    // ── Stages ──

    /// Create a stage. Returns its id. Stages are never removed, so callers
    /// create what they need once and update coefficients afterwards.
    pub fn add_stage(
        &mut self,
        role: StageRole,
        coefficients: Coefficients,
    ) -> PipelineResult<StageId> {
        self.ensure_unlocked()?;
        if self.stages.len() >= self.stage_limit {
            return Err(PipelineError::StageLimit(self.stage_limit));
        }
        let id = StageId(self.stages.len() as u32);
        self.stages.push(Stage::new(id, role, coefficients)?);
        self.invalidate_compiled_plan();
        tracing::debug!("Added stage {:?} ({})", id, role.name());
        Ok(id)
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.get(id.index())
    }

    /// Stages in creation order.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Replace a stage's coefficients in place. Allowed while streaming.
    pub fn update_coefficients(
        &mut self,
        id: StageId,
        coefficients: Coefficients,
    ) -> PipelineResult<()> {
        let stage = self
            .stages
            .get_mut(id.index())
            .ok_or(PipelineError::InvalidStage(id))?;
        stage.set_coefficients(coefficients)?;
        tracing::trace!(
            "Updated coefficients of {:?} ({}), revision {}",
            id,
            stage.name(),
            stage.revision()
        );
        Ok(())
    }

    // ── Edges ──

    /// Connect output port `from` to input port `to`.
    pub fn connect(&mut self, from: PortId, to: PortId) -> PipelineResult<EdgeId> {
        self.ensure_unlocked()?;

        let from_stage = self.existing(from.stage())?.role();
        let to_stage = self.existing(to.stage())?.role();

        let from_port = nth_port(from_stage.ports(), PortDirection::Output, from.port_index())
            .ok_or(PipelineError::NoSuchPort {
                stage: from.stage(),
                direction: "output",
                port: from.port_index(),
            })?;
        let to_port = nth_port(to_stage.ports(), PortDirection::Input, to.port_index()).ok_or(
            PipelineError::NoSuchPort {
                stage: to.stage(),
                direction: "input",
                port: to.port_index(),
            },
        )?;

        if from_port.signal != to_port.signal {
            return Err(PipelineError::PortMismatch {
                from,
                to,
                from_signal: from_port.signal,
                to_signal: to_port.signal,
            });
        }
        if self.edges.iter().any(|edge| edge.to == to) {
            return Err(PipelineError::InputOccupied(to));
        }
        if from.stage() == to.stage() || self.would_create_cycle(from.stage(), to.stage()) {
            return Err(PipelineError::CycleDetected);
        }

        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge { id, from, to });
        self.invalidate_compiled_plan();
        tracing::trace!("Connected {:?} -> {:?} as {:?}", from, to, id);
        Ok(id)
    }

    /// Remove every edge. Stages and their coefficients are untouched.
    /// Returns the number of edges removed.
    pub fn disconnect_all(&mut self) -> PipelineResult<usize> {
        self.ensure_unlocked()?;
        let removed = self.edges.len();
        self.edges.clear();
        self.invalidate_compiled_plan();
        tracing::debug!("Disconnected {} edges", removed);
        Ok(removed)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Whether any edge touches `id`.
    pub fn is_connected(&self, id: StageId) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.from.stage() == id || edge.to.stage() == id)
    }

    /// Stages touched by at least one edge.
    pub fn connected_stages(&self) -> BTreeSet<StageId> {
        self.edges
            .iter()
            .flat_map(|edge| [edge.from.stage(), edge.to.stage()])
            .collect()
    }

    /// The edge feeding input port `to`, if any.
    pub fn upstream_of(&self, to: PortId) -> Option<PortId> {
        self.edges
            .iter()
            .find(|edge| edge.to == to)
            .map(|edge| edge.from)
    }

    /// Check if adding an edge from `from` to `to` would create a cycle.
    fn would_create_cycle(&self, from: StageId, to: StageId) -> bool {
        // If `to` can reach `from` through existing edges, adding from->to creates a cycle.
        let mut visited = vec![false; self.stages.len()];
        let mut stack = vec![to];

        while let Some(current) = stack.pop() {
            if current == from {
                return true;
            }
            let idx = current.index();
            if idx >= self.stages.len() || visited[idx] {
                continue;
            }
            visited[idx] = true;

            for edge in &self.edges {
                if edge.from.stage() == current {
                    stack.push(edge.to.stage());
                }
            }
        }
        false
    }

    // ── Compiled plan ──

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Which stages carry signal, recompiled lazily after topology changes.
    pub fn compiled_plan(&mut self) -> &CompiledPlan {
        self.recompile_if_needed();
        &self.compiled_plan
    }

    fn invalidate_compiled_plan(&mut self) {
        self.compiled_plan_dirty = true;
        self.generation += 1;
    }

    fn recompile_if_needed(&mut self) {
        if !self.compiled_plan_dirty {
            return;
        }
        self.compiled_plan = PlanCompiler::compile(&self.stages, &self.edges, self.generation);
        self.compiled_plan_dirty = false;

        tracing::debug!(
            "Stage graph recompiled: {} carrying, {} idle (gen {})",
            self.compiled_plan.order.len(),
            self.compiled_plan.idle_stages,
            self.compiled_plan.generation,
        );
        for &sink in &self.compiled_plan.starved_sinks {
            if let Some(stage) = self.stages.get(sink.index()) {
                tracing::trace!("Sink {:?} ({}) is not fed by any source", sink, stage.name());
            }
        }
    }

    // ── Streaming ──

    pub fn gate(&self) -> StreamGate {
        self.gate.clone()
    }

    pub fn is_streaming(&self) -> bool {
        self.gate.is_open()
    }

    /// Open the gate. The topology is locked until `stop`.
    pub fn start(&mut self) {
        if self.is_streaming() {
            return;
        }
        let plan = self.compiled_plan();
        tracing::info!("Streaming started with {} carrying stages", plan.order.len());
        self.gate.streaming.store(true, Ordering::Release);
    }

    /// Close the gate. Work already in flight finishes; see `wait`.
    pub fn stop(&mut self) {
        if self.gate.streaming.swap(false, Ordering::AcqRel) {
            tracing::info!("Streaming stopped");
        }
    }

    /// Block until all in-flight work has finished.
    pub fn wait(&self) {
        while self.gate.in_flight() > 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn ensure_unlocked(&self) -> PipelineResult<()> {
        if self.is_streaming() {
            Err(PipelineError::TopologyLocked)
        } else {
            Ok(())
        }
    }

    fn existing(&self, id: StageId) -> PipelineResult<&Stage> {
        self.stages
            .get(id.index())
            .ok_or(PipelineError::InvalidStage(id))
    }
}

impl Default for FlowGraph {
    fn default() -> Self {
        Self::new()
    }
}
