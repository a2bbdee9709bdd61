use super::compiled_plan::CompiledPlan;
use super::graph::Edge;
use super::stage::Stage;
use std::collections::VecDeque;

/// Works out which stages of the wired graph carry signal.
pub struct PlanCompiler;

impl PlanCompiler {
    /// A stage carries signal when a source reaches it and it reaches a
    /// sink. Chain stages the current mode leaves unwired end up idle; a
    /// sink no source reaches is starved.
    pub fn compile(stages: &[Stage], edges: &[Edge], generation: u64) -> CompiledPlan {
        let n = stages.len();
        let (downstream, upstream) = Self::adjacency(n, edges);

        let sources = Self::indices(stages, |stage| stage.role().is_source());
        let sinks = Self::indices(stages, |stage| stage.role().is_sink());

        let fed = Self::reachable(&sources, &downstream, n);
        let drained = Self::reachable(&sinks, &upstream, n);

        // A lone source or sink with no edges carries nothing.
        let wired = |i: usize| !downstream[i].is_empty() || !upstream[i].is_empty();
        let carrying: Vec<bool> = (0..n).map(|i| fed[i] && drained[i] && wired(i)).collect();

        let order = Self::upstream_first(&downstream, &carrying);
        let starved_sinks = sinks
            .iter()
            .filter(|&&sink| !carrying[sink])
            .map(|&sink| stages[sink].id())
            .collect();

        CompiledPlan {
            idle_stages: n - order.len(),
            order: order.into_iter().map(|i| stages[i].id()).collect(),
            starved_sinks,
            generation,
        }
    }

    fn adjacency(n: usize, edges: &[Edge]) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
        let mut downstream = vec![Vec::new(); n];
        let mut upstream = vec![Vec::new(); n];
        for edge in edges {
            let from = edge.from.stage().index();
            let to = edge.to.stage().index();
            if from < n && to < n {
                downstream[from].push(to);
                upstream[to].push(from);
            }
        }
        (downstream, upstream)
    }

    fn indices(stages: &[Stage], pred: impl Fn(&Stage) -> bool) -> Vec<usize> {
        stages
            .iter()
            .enumerate()
            .filter(|(_, stage)| pred(stage))
            .map(|(idx, _)| idx)
            .collect()
    }

    fn reachable(roots: &[usize], adj: &[Vec<usize>], n: usize) -> Vec<bool> {
        let mut seen = vec![false; n];
        let mut stack = roots.to_vec();
        for &root in roots {
            seen[root] = true;
        }
        while let Some(node) = stack.pop() {
            for &next in &adj[node] {
                if !seen[next] {
                    seen[next] = true;
                    stack.push(next);
                }
            }
        }
        seen
    }

    /// Kahn's algorithm restricted to the carrying stages.
    fn upstream_first(downstream: &[Vec<usize>], carrying: &[bool]) -> Vec<usize> {
        let n = carrying.len();
        let mut in_degree = vec![0usize; n];
        for (from, targets) in downstream.iter().enumerate() {
            if !carrying[from] {
                continue;
            }
            for &to in targets {
                if carrying[to] {
                    in_degree[to] += 1;
                }
            }
        }

        let mut queue: VecDeque<usize> = (0..n)
            .filter(|&i| carrying[i] && in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &next in &downstream[node] {
                if !carrying[next] {
                    continue;
                }
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::id::{EdgeId, StageId};
    use crate::pipeline::stage::{Coefficients, StageRole};

    fn position(plan: &CompiledPlan, id: StageId) -> Option<usize> {
        plan.order.iter().position(|&s| s == id)
    }

    fn stage(idx: u32, role: StageRole) -> Stage {
        Stage::new(StageId(idx), role, Coefficients::None).unwrap()
    }

    fn edge(id: u32, from: u32, to: u32) -> Edge {
        Edge {
            id: EdgeId(id),
            from: StageId(from).port(0),
            to: StageId(to).port(0),
        }
    }

    #[test]
    fn test_unwired_sink_is_starved() {
        let stages = vec![
            stage(0, StageRole::Source),
            stage(1, StageRole::Volume),
            stage(2, StageRole::AudioSink),
        ];

        let plan = PlanCompiler::compile(&stages, &[], 1);

        assert!(plan.is_empty());
        assert_eq!(plan.idle_stages, 3);
        assert_eq!(plan.starved_sinks, vec![StageId(2)]);
        assert!(plan.verify().is_err());
    }

    #[test]
    fn test_linear_chain_runs_upstream_first() {
        let stages = vec![
            stage(0, StageRole::AudioSink),
            stage(1, StageRole::Volume),
            stage(2, StageRole::Source),
            stage(3, StageRole::Magnitude),
        ];
        let edges = vec![edge(0, 2, 3), edge(1, 3, 1), edge(2, 1, 0)];

        let plan = PlanCompiler::compile(&stages, &edges, 7);

        assert_eq!(plan.generation, 7);
        assert_eq!(
            plan.order,
            vec![StageId(2), StageId(3), StageId(1), StageId(0)]
        );
        assert_eq!(plan.verify(), Ok(()));
    }

    #[test]
    fn test_branch_without_source_starves_its_sink() {
        // magnitude -> volume -> sink, but nothing feeds magnitude
        let stages = vec![
            stage(0, StageRole::Source),
            stage(1, StageRole::Magnitude),
            stage(2, StageRole::Volume),
            stage(3, StageRole::AudioSink),
            stage(4, StageRole::LogPowerFft),
            stage(5, StageRole::SpectrumProbe),
        ];
        let edges = vec![edge(0, 1, 2), edge(1, 2, 3), edge(2, 0, 4), edge(3, 4, 5)];

        let plan = PlanCompiler::compile(&stages, &edges, 1);

        assert_eq!(plan.starved_sinks, vec![StageId(3)]);
        assert!(position(&plan, StageId(0)) < position(&plan, StageId(5)));
        assert!(!plan.carries(StageId(1)));
        assert_eq!(plan.idle_stages, 3);
    }

    #[test]
    fn test_dangling_branch_is_idle() {
        let stages = vec![
            stage(0, StageRole::Source),
            stage(1, StageRole::Magnitude),
            stage(2, StageRole::Volume),
            stage(3, StageRole::Translate),
        ];
        let edges = vec![edge(0, 0, 1), edge(1, 1, 2)];

        let plan = PlanCompiler::compile(&stages, &edges, 1);

        assert!(plan.is_empty());
        assert_eq!(plan.idle_stages, 4);
        assert!(plan.starved_sinks.is_empty());
    }
}
