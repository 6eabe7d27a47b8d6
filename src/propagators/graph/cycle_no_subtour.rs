use crate::basic_types::Conflict;
use crate::basic_types::ConflictReason;
use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::TrailedInt;
use crate::engine::cp::domain_events::GraphEvents;
use crate::engine::cp::domain_events::GraphUpdate;
use crate::engine::propagation::EnqueueDecision;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::ManipulateTrailedValues;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::PropagationContextWithTrailedValues;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::ReadDomains;
use crate::variables::GraphId;

/// Sub-tour elimination for an undirected Hamiltonian cycle, the undirected adaptation of the
/// nocycle constraint of Caseau and Laburthe.
///
/// The mandatory edges form a set of disjoint chains. For each chain the propagator keeps,
/// reversibly, the opposite endpoint and the node count at both of its endpoints. Enforcing
/// an edge splices two chains in O(1); an edge that would close a chain covering fewer than
/// all nodes is a contradiction, and while a chain remains partial the envelope edge joining
/// its two endpoints is removed so no later decision can close it.
#[derive(Clone, Debug)]
pub(crate) struct CycleNoSubtourPropagator {
    graph: GraphId,
    /// For a chain endpoint u, the chain's opposite endpoint. Only meaningful at endpoints.
    chain_end: Vec<TrailedInt>,
    /// For a chain endpoint u, the number of nodes on its chain.
    chain_length: Vec<TrailedInt>,
    /// Enforced edges not yet processed.
    pending: Vec<(u32, u32)>,
}

impl CycleNoSubtourPropagator {
    pub(crate) fn new(graph: GraphId) -> Self {
        CycleNoSubtourPropagator {
            graph,
            chain_end: Vec::new(),
            chain_length: Vec::new(),
            pending: Vec::new(),
        }
    }

    fn process_enforced_edge(
        &mut self,
        context: &mut PropagationContextMut,
        i: u32,
        j: u32,
    ) -> PropagationStatusCP {
        let num_nodes = context.num_nodes(self.graph);

        if context.kernel_out_degree(self.graph, i) > 2
            || context.kernel_out_degree(self.graph, j) > 2
        {
            return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
        }

        let end_i = context.value(self.chain_end[i as usize]) as u32;
        let end_j = context.value(self.chain_end[j as usize]) as u32;

        if end_i == j {
            // i and j are the two endpoints of the same chain: this edge closes it. Legal
            // only as the final Hamiltonian closure, after which there is nothing left for
            // this propagator to do on this branch.
            let length = context.value(self.chain_length[i as usize]) as usize;
            if length < num_nodes {
                return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
            }
            context.set_passive();
            return Ok(());
        }

        let length = context.value(self.chain_length[i as usize])
            + context.value(self.chain_length[j as usize]);
        context.assign(self.chain_end[end_i as usize], end_j as i64);
        context.assign(self.chain_end[end_j as usize], end_i as i64);
        context.assign(self.chain_length[end_i as usize], length);
        context.assign(self.chain_length[end_j as usize], length);

        if (length as usize) < num_nodes
            && context.is_arc_in_envelope(self.graph, end_i, end_j)
            && !context.is_arc_in_kernel(self.graph, end_i, end_j)
        {
            context.remove_arc(self.graph, end_i, end_j)?;
        }
        Ok(())
    }
}

impl Propagator for CycleNoSubtourPropagator {
    fn name(&self) -> &str {
        "CycleNoSubtour"
    }

    fn priority(&self) -> Priority {
        Priority::Binary
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP {
        assert!(
            !context.graph_assignments().is_directed(self.graph),
            "CycleNoSubtour applies to undirected graphs"
        );

        let num_nodes = context.num_nodes(self.graph);
        self.chain_end = (0..num_nodes)
            .map(|node| context.new_trailed_integer(node as i64))
            .collect();
        self.chain_length = (0..num_nodes)
            .map(|_| context.new_trailed_integer(1))
            .collect();

        // Edges already mandatory at post time go through the same splicing.
        for i in 0..num_nodes as u32 {
            for j in context.kernel_successors(self.graph, i) {
                if i < j {
                    self.pending.push((i, j));
                }
            }
        }

        context.register_graph(self.graph, GraphEvents::ARC_ENFORCED, LocalId::from(0));
        Ok(())
    }

    fn notify_graph(
        &mut self,
        _context: PropagationContextWithTrailedValues,
        _local_id: LocalId,
        update: GraphUpdate,
    ) -> EnqueueDecision {
        if let GraphUpdate::ArcEnforced(from, to) = update {
            self.pending.push((from, to));
        }
        EnqueueDecision::Enqueue
    }

    fn synchronise(&mut self, _context: PropagationContext) {
        self.pending.clear();
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let pending = std::mem::take(&mut self.pending);
        for (i, j) in pending {
            self.process_enforced_edge(&mut context, i, j)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::cp::test_solver::TestSolver;
    use crate::variables::edge_sets::complete_edges;
    use super::*;

    #[test]
    fn the_chord_closing_a_partial_chain_is_removed() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(4, &complete_edges(4));
        let _ = solver
            .new_propagator(CycleNoSubtourPropagator::new(g))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 0, 1).expect("feasible");
        solver.enforce_arc_and_propagate(g, 1, 2).expect("feasible");

        // The chain is 0-1-2; the chord (0, 2) would close a 3-cycle on 4 nodes.
        assert!(!solver.is_arc_in_envelope(g, 0, 2));
    }

    #[test]
    fn the_final_closure_is_kept_and_accepted() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(4, &complete_edges(4));
        let _ = solver
            .new_propagator(CycleNoSubtourPropagator::new(g))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 0, 1).expect("feasible");
        solver.enforce_arc_and_propagate(g, 1, 2).expect("feasible");
        solver.enforce_arc_and_propagate(g, 2, 3).expect("feasible");

        // The chain covers all nodes, so its closing edge survives and may be enforced.
        assert!(solver.is_arc_in_envelope(g, 0, 3));
        solver.enforce_arc_and_propagate(g, 0, 3).expect("feasible");
    }

    #[test]
    fn splicing_is_undone_by_backtracking() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(5, &complete_edges(5));
        let _ = solver
            .new_propagator(CycleNoSubtourPropagator::new(g))
            .expect("consistent at the root");

        solver.increase_decision_level();
        solver.enforce_arc_and_propagate(g, 0, 1).expect("feasible");
        solver.enforce_arc_and_propagate(g, 1, 2).expect("feasible");
        assert!(!solver.is_arc_in_envelope(g, 0, 2));

        solver.backtrack_to(0);
        assert!(solver.is_arc_in_envelope(g, 0, 2));

        // The chain state has been rewound too: 0-2 is now a legal splice.
        solver.enforce_arc_and_propagate(g, 0, 2).expect("feasible");
        assert!(solver.is_arc_in_kernel(g, 0, 2));
    }
}
