use itertools::Itertools;

use crate::basic_types::Conflict;
use crate::basic_types::ConflictReason;
use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::domain_events::DomainEvents;
use crate::engine::cp::domain_events::GraphEvents;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::ReadDomains;
use crate::variables::DomainId;
use crate::variables::GraphId;

/// Checks that the graph can still be partitioned into `k` cliques: every kernel component
/// must remain completable to a clique within the envelope.
///
/// The closure of kernel components into cliques is done by the transitivity propagator; this
/// propagator fails as soon as two nodes of the same kernel component can no longer be
/// adjacent, which transitivity alone only detects once the connecting edges are enforced.
#[derive(Clone, Debug)]
pub(crate) struct KCliquesPropagator {
    graph: GraphId,
    k: DomainId,
}

impl KCliquesPropagator {
    pub(crate) fn new(graph: GraphId, k: DomainId) -> Self {
        KCliquesPropagator { graph, k }
    }
}

impl Propagator for KCliquesPropagator {
    fn name(&self) -> &str {
        "KCliques"
    }

    fn priority(&self) -> Priority {
        Priority::Quadratic
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP {
        assert!(
            !context.graph_assignments().is_directed(self.graph),
            "KCliques applies to undirected graphs"
        );
        context.register_graph(self.graph, GraphEvents::ANY_GRAPH, LocalId::from(0));
        context.register(self.k, DomainEvents::BOUNDS, LocalId::from(1));
        Ok(())
    }

    fn propagate(&mut self, context: PropagationContextMut) -> PropagationStatusCP {
        let num_nodes = context.num_nodes(self.graph);

        // Scratch union-find over the kernel.
        let mut parent: Vec<u32> = (0..num_nodes as u32).collect();
        fn find(parent: &mut [u32], mut x: u32) -> u32 {
            while parent[x as usize] != x {
                parent[x as usize] = parent[parent[x as usize] as usize];
                x = parent[x as usize];
            }
            x
        }
        for u in 0..num_nodes as u32 {
            for v in context.kernel_successors(self.graph, u) {
                let (ru, rv) = (find(&mut parent, u), find(&mut parent, v));
                if ru != rv {
                    parent[ru as usize] = rv;
                }
            }
        }

        // Every pair within a kernel component must still be adjacent in the envelope.
        let mut members: Vec<Vec<u32>> = vec![Vec::new(); num_nodes];
        for u in 0..num_nodes as u32 {
            if context.is_node_in_kernel(self.graph, u) {
                members[find(&mut parent, u) as usize].push(u);
            }
        }
        for component in members.iter().filter(|m| m.len() > 1) {
            for (&u, &v) in component.iter().tuple_combinations() {
                if !context.is_arc_in_envelope(self.graph, u, v) {
                    return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::cp::test_solver::TestSolver;
    use super::*;

    #[test]
    fn a_component_that_cannot_become_a_clique_fails() {
        let mut solver = TestSolver::default();
        // A path 0-1-2 with the chord (0, 2) missing from the envelope.
        let g = solver.new_undirected_graph(3, &[(0, 1), (1, 2)]);
        let k = solver.new_variable(0, 3);
        let _ = solver
            .new_propagator(KCliquesPropagator::new(g, k))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 0, 1).expect("feasible");
        assert!(solver.enforce_arc_and_propagate(g, 1, 2).is_err());
    }

    #[test]
    fn completable_components_are_accepted() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(3, &[(0, 1), (1, 2), (0, 2)]);
        let k = solver.new_variable(0, 3);
        let _ = solver
            .new_propagator(KCliquesPropagator::new(g, k))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 0, 1).expect("feasible");
        solver.enforce_arc_and_propagate(g, 1, 2).expect("feasible");
    }
}
