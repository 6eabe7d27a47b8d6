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

/// Circuit prevention for a directed Hamiltonian path from `origin` to `destination`, in the
/// style of the nocycle constraint of Caseau and Laburthe.
///
/// The mandatory arcs form disjoint directed chains. The propagator reversibly tracks, at the
/// endpoints of each chain, the chain's start, end, and node count. Enforcing an arc splices
/// two chains in O(1); an arc whose head already starts the chain ending in its tail would
/// close a circuit and is a contradiction, and for each partial chain the envelope arc from
/// its end back to its start is removed. Closing the origin-to-destination chain early,
/// before it covers every node, is a contradiction too: the stranded nodes could no longer
/// join the path.
#[derive(Clone, Debug)]
pub(crate) struct PathNoCyclePropagator {
    graph: GraphId,
    origin: u32,
    destination: u32,
    /// For the end node of a chain, the chain's start node.
    chain_start: Vec<TrailedInt>,
    /// For the start node of a chain, the chain's end node.
    chain_end: Vec<TrailedInt>,
    /// For both endpoints of a chain, the chain's node count.
    chain_length: Vec<TrailedInt>,
    pending: Vec<(u32, u32)>,
}

impl PathNoCyclePropagator {
    pub(crate) fn new(graph: GraphId, origin: u32, destination: u32) -> Self {
        PathNoCyclePropagator {
            graph,
            origin,
            destination,
            chain_start: Vec::new(),
            chain_end: Vec::new(),
            chain_length: Vec::new(),
            pending: Vec::new(),
        }
    }

    fn process_enforced_arc(
        &mut self,
        context: &mut PropagationContextMut,
        tail: u32,
        head: u32,
    ) -> PropagationStatusCP {
        if tail == head {
            return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
        }
        if context.kernel_out_degree(self.graph, tail) > 1
            || context.kernel_in_degree(self.graph, head) > 1
        {
            return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
        }

        let start = context.value(self.chain_start[tail as usize]) as u32;
        let end = context.value(self.chain_end[head as usize]) as u32;

        if start == head {
            // The chain head -> ... -> tail exists; this arc would close a circuit.
            return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
        }

        let length = context.value(self.chain_length[tail as usize])
            + context.value(self.chain_length[head as usize]);
        context.assign(self.chain_start[end as usize], start as i64);
        context.assign(self.chain_end[start as usize], end as i64);
        context.assign(self.chain_length[start as usize], length);
        context.assign(self.chain_length[end as usize], length);

        let num_nodes = context.num_nodes(self.graph);
        if start == self.origin && end == self.destination {
            // The origin-to-destination chain is only legal once it is the whole path.
            if (length as usize) < num_nodes {
                return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
            }
            return Ok(());
        }

        if context.is_arc_in_envelope(self.graph, end, start)
            && !context.is_arc_in_kernel(self.graph, end, start)
        {
            context.remove_arc(self.graph, end, start)?;
        }
        Ok(())
    }
}

impl Propagator for PathNoCyclePropagator {
    fn name(&self) -> &str {
        "PathNoCycle"
    }

    fn priority(&self) -> Priority {
        Priority::Binary
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP {
        assert!(
            context.graph_assignments().is_directed(self.graph),
            "PathNoCycle applies to directed graphs"
        );

        let num_nodes = context.num_nodes(self.graph);
        self.chain_start = (0..num_nodes)
            .map(|node| context.new_trailed_integer(node as i64))
            .collect();
        self.chain_end = (0..num_nodes)
            .map(|node| context.new_trailed_integer(node as i64))
            .collect();
        self.chain_length = (0..num_nodes)
            .map(|_| context.new_trailed_integer(1))
            .collect();

        for tail in 0..num_nodes as u32 {
            for head in context.kernel_successors(self.graph, tail) {
                self.pending.push((tail, head));
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
        for (tail, head) in pending {
            self.process_enforced_arc(&mut context, tail, head)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::cp::test_solver::TestSolver;
    use crate::variables::edge_sets::complete_arcs;
    use super::*;

    #[test]
    fn the_arc_closing_a_partial_chain_is_removed() {
        let mut solver = TestSolver::default();
        let g = solver.new_directed_graph(4, &complete_arcs(4, false));
        let _ = solver
            .new_propagator(PathNoCyclePropagator::new(g, 0, 3))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 1, 2).expect("feasible");

        // Chain 1 -> 2: the return arc (2, 1) would close a circuit.
        assert!(!solver.is_arc_in_envelope(g, 2, 1));
        assert!(solver.is_arc_in_envelope(g, 1, 2));
    }

    #[test]
    fn closing_a_circuit_fails() {
        let mut solver = TestSolver::default();
        let g = solver.new_directed_graph(4, &complete_arcs(4, false));
        let _ = solver
            .new_propagator(PathNoCyclePropagator::new(g, 0, 3))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 1, 2).expect("feasible");

        // (2, 1) has been removed, so enforcing it is rejected by the domain store.
        assert!(solver.enforce_arc_and_propagate(g, 2, 1).is_err());
    }

    #[test]
    fn an_early_origin_destination_chain_fails() {
        let mut solver = TestSolver::default();
        let g = solver.new_directed_graph(4, &complete_arcs(4, false));
        let _ = solver
            .new_propagator(PathNoCyclePropagator::new(g, 0, 3))
            .expect("consistent at the root");

        // 0 -> 3 directly strands nodes 1 and 2.
        assert!(solver.enforce_arc_and_propagate(g, 0, 3).is_err());
    }

    #[test]
    fn the_complete_path_is_accepted() {
        let mut solver = TestSolver::default();
        let g = solver.new_directed_graph(4, &complete_arcs(4, false));
        let _ = solver
            .new_propagator(PathNoCyclePropagator::new(g, 0, 3))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 0, 1).expect("feasible");
        solver.enforce_arc_and_propagate(g, 1, 2).expect("feasible");
        solver.enforce_arc_and_propagate(g, 2, 3).expect("feasible");
    }

    #[test]
    fn chains_are_rewound_by_backtracking() {
        let mut solver = TestSolver::default();
        let g = solver.new_directed_graph(5, &complete_arcs(5, false));
        let _ = solver
            .new_propagator(PathNoCyclePropagator::new(g, 0, 4))
            .expect("consistent at the root");

        solver.increase_decision_level();
        solver.enforce_arc_and_propagate(g, 1, 2).expect("feasible");
        solver.enforce_arc_and_propagate(g, 2, 3).expect("feasible");
        assert!(!solver.is_arc_in_envelope(g, 3, 1));

        solver.backtrack_to(0);
        assert!(solver.is_arc_in_envelope(g, 3, 1));
        solver.enforce_arc_and_propagate(g, 3, 1).expect("feasible");
    }
}
