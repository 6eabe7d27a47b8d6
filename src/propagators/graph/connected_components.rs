use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::ReversibleUnionFind;
use crate::engine::cp::TrailedInt;
use crate::engine::cp::domain_events::DomainEvents;
use crate::engine::cp::domain_events::GraphEvents;
use crate::engine::cp::domain_events::GraphUpdate;
use crate::engine::propagation::EnqueueDecision;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::ManipulateTrailedValues;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::PropagationContextWithTrailedValues;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::ReadDomains;
use crate::variables::DomainId;
use crate::variables::GraphId;

/// Bounds the number of connected components `k` of the final graph.
///
/// The kernel only merges as arcs are enforced, so the number of kernel components is an
/// upper bound on the components that kernel nodes can still form; every optional node can at
/// most add one more. Conversely, components of the envelope can never be joined, so the
/// number of envelope components containing at least one mandatory node is a lower bound.
/// The kernel side is maintained incrementally through a reversible union-find; the envelope
/// side is recounted by a sweep per run, as splits cannot be tracked incrementally.
#[derive(Debug)]
pub(crate) struct KConnectedComponentsPropagator {
    graph: GraphId,
    k: DomainId,
    kernel_components: ReversibleUnionFind,
    /// The number of kernel components over the current kernel nodes.
    kernel_component_count: TrailedInt,
}

const GRAPH_VAR: LocalId = LocalId::from(0);
const K_VAR: LocalId = LocalId::from(1);

impl KConnectedComponentsPropagator {
    pub(crate) fn new(graph: GraphId, k: DomainId) -> Self {
        KConnectedComponentsPropagator {
            graph,
            k,
            kernel_components: ReversibleUnionFind::new(0, |_| Default::default()),
            kernel_component_count: TrailedInt::default(),
        }
    }

    /// The number of envelope components containing at least one kernel node. Treats arcs as
    /// undirected connectivity.
    fn count_forced_envelope_components(&self, context: &impl ReadDomains) -> i64 {
        let num_nodes = context.num_nodes(self.graph);
        let mut visited = vec![false; num_nodes];
        let mut stack = Vec::new();
        let mut components = 0;

        for start in 0..num_nodes as u32 {
            if visited[start as usize]
                || !context.is_node_in_kernel(self.graph, start)
                || !context.is_node_in_envelope(self.graph, start)
            {
                continue;
            }
            components += 1;
            visited[start as usize] = true;
            stack.push(start);
            while let Some(node) = stack.pop() {
                let neighbours = context
                    .envelope_successors(self.graph, node)
                    .chain(context.envelope_predecessors(self.graph, node))
                    .collect::<Vec<_>>();
                for next in neighbours {
                    if !visited[next as usize] {
                        visited[next as usize] = true;
                        stack.push(next);
                    }
                }
            }
        }
        components
    }
}

impl Propagator for KConnectedComponentsPropagator {
    fn name(&self) -> &str {
        "KConnectedComponents"
    }

    fn priority(&self) -> Priority {
        Priority::Linear
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP {
        let num_nodes = context.num_nodes(self.graph);
        self.kernel_components =
            ReversibleUnionFind::new(num_nodes, |value| context.new_trailed_integer(value));
        self.kernel_component_count =
            context.new_trailed_integer(context.num_kernel_nodes(self.graph) as i64);

        // Arcs already mandatory at post time are merged right away.
        let kernel_arcs: Vec<(u32, u32)> = (0..num_nodes as u32)
            .flat_map(|from| {
                context
                    .kernel_successors(self.graph, from)
                    .map(move |to| (from, to))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (from, to) in kernel_arcs {
            if from != to && self.kernel_components.union(context, from, to) {
                context.add_assign(self.kernel_component_count, -1);
            }
        }

        context.register_graph(self.graph, GraphEvents::ANY_GRAPH, GRAPH_VAR);
        context.register(self.k, DomainEvents::BOUNDS, K_VAR);
        Ok(())
    }

    fn notify_graph(
        &mut self,
        mut context: PropagationContextWithTrailedValues,
        _local_id: LocalId,
        update: GraphUpdate,
    ) -> EnqueueDecision {
        match update {
            GraphUpdate::ArcEnforced(from, to) => {
                if from != to && self.kernel_components.union(&mut context, from, to) {
                    context.add_assign(self.kernel_component_count, -1);
                }
            }
            GraphUpdate::NodeEnforced(_) => {
                context.add_assign(self.kernel_component_count, 1);
            }
            GraphUpdate::ArcRemoved(_, _) | GraphUpdate::NodeRemoved(_) => {}
        }
        EnqueueDecision::Enqueue
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let kernel_components = context.value(self.kernel_component_count);
        let optional_nodes = (context.num_envelope_nodes(self.graph)
            - context.num_kernel_nodes(self.graph)) as i64;
        let most_possible = kernel_components + optional_nodes;

        let fewest_possible = self.count_forced_envelope_components(&context);

        context.set_lower_bound(&self.k, fewest_possible.min(i32::MAX as i64) as i32)?;
        context.set_upper_bound(&self.k, most_possible.min(i32::MAX as i64) as i32)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::cp::test_solver::TestSolver;
    use super::*;

    #[test]
    fn two_separate_triangles_fix_k_to_two() {
        let mut solver = TestSolver::default();
        let edges = [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)];
        let g = solver.new_undirected_graph(6, &edges);
        let k = solver.new_variable(0, 6);
        let _ = solver
            .new_propagator(KConnectedComponentsPropagator::new(g, k))
            .expect("consistent at the root");

        for (i, j) in edges {
            solver.enforce_arc_and_propagate(g, i, j).expect("feasible");
        }

        solver.assert_bounds(k, 2, 2);
    }

    #[test]
    fn component_counts_are_rewound_by_backtracking() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(4, &[(0, 1), (2, 3)]);
        let k = solver.new_variable(0, 10);
        let _ = solver
            .new_propagator(KConnectedComponentsPropagator::new(g, k))
            .expect("consistent at the root");

        // Two envelope components over four kernel nodes.
        solver.assert_bounds(k, 2, 4);

        solver.increase_decision_level();
        solver.enforce_arc_and_propagate(g, 0, 1).expect("feasible");
        solver.enforce_arc_and_propagate(g, 2, 3).expect("feasible");
        solver.assert_bounds(k, 2, 2);

        solver.backtrack_to(0);
        solver.assert_bounds(k, 2, 4);
    }

    #[test]
    fn demanding_more_components_than_possible_fails() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(3, &[(0, 1), (1, 2), (0, 2)]);
        let k = solver.new_variable(3, 3);
        let _ = solver
            .new_propagator(KConnectedComponentsPropagator::new(g, k))
            .expect("consistent at the root");

        // Any merge drops the possible component count below three.
        assert!(solver.enforce_arc_and_propagate(g, 0, 1).is_err());
    }
}
