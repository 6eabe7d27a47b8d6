use crate::basic_types::Conflict;
use crate::basic_types::ConflictReason;
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
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::PropagationContextWithTrailedValues;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::ReadDomains;
use crate::variables::DomainId;
use crate::variables::GraphId;

/// Partitions a directed graph into `k` anti-arborescences. Roots are identified by
/// self-loops; every node follows its single outgoing arc towards its root.
///
/// Invariants maintained:
/// - a node with a mandatory self-loop is a root and keeps no other outgoing arc;
/// - a mandatory cycle over distinct nodes can never be completed (only self-loops close
///   chains), detected in O(log n) per arc through a reversible union-find over the chains
///   of mandatory out-arcs, whose per-set label is the chain's terminal node;
/// - the number of roots is exactly `k`: mandatory self-loops bound it from below, nodes
///   whose self-loop is still possible bound it from above, and tight bounds force the
///   remaining self-loops in or out;
/// - every node must reach a potential root through envelope arcs (checked by a reverse
///   sweep from the potential roots whenever the envelope shrank).
///
/// Every node is assumed to be part of the solution graph; the out-degree-one requirement
/// itself is posted alongside as a degree propagator.
#[derive(Debug)]
pub(crate) struct TreePropagator {
    graph: GraphId,
    k: DomainId,
    chains: ReversibleUnionFind,
    num_kernel_roots: TrailedInt,
    pending: Vec<GraphUpdate>,
    envelope_shrunk: bool,
}

const GRAPH_VAR: LocalId = LocalId::from(0);
const K_VAR: LocalId = LocalId::from(1);

impl TreePropagator {
    pub(crate) fn new(graph: GraphId, k: DomainId) -> Self {
        TreePropagator {
            graph,
            k,
            chains: ReversibleUnionFind::new(0, |_| Default::default()),
            num_kernel_roots: TrailedInt::default(),
            pending: Vec::new(),
            envelope_shrunk: true,
        }
    }

    fn process_enforced_arc(
        &mut self,
        context: &mut PropagationContextMut,
        tail: u32,
        head: u32,
        worklist: &mut Vec<GraphUpdate>,
    ) -> PropagationStatusCP {
        if tail == head {
            context.add_assign(self.num_kernel_roots, 1);
            // A root owns no other outgoing arc.
            let others: Vec<u32> = context
                .envelope_successors(self.graph, tail)
                .filter(|&to| to != tail)
                .collect();
            for to in others {
                context.remove_arc(self.graph, tail, to)?;
                worklist.push(GraphUpdate::ArcRemoved(tail, to));
            }
            return Ok(());
        }

        if context.is_arc_in_kernel(self.graph, tail, tail) {
            // A second outgoing arc of a root.
            return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
        }

        let terminal = self.chains.read_label(context, head) as u32;
        if terminal == tail {
            // The out-arc chain from `head` already ends at `tail`: a proper cycle.
            return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
        }
        let _ = self.chains.union(context, tail, head);
        self.chains.write_label(context, tail, terminal as i64);
        Ok(())
    }

    fn filter_roots(
        &mut self,
        context: &mut PropagationContextMut,
        worklist: &mut Vec<GraphUpdate>,
    ) -> PropagationStatusCP {
        let num_nodes = context.num_nodes(self.graph) as u32;
        let mandatory_roots = context.value(self.num_kernel_roots) as i32;
        let possible_roots = (0..num_nodes)
            .filter(|&node| context.is_arc_in_envelope(self.graph, node, node))
            .count() as i32;

        context.set_lower_bound(&self.k, mandatory_roots)?;
        context.set_upper_bound(&self.k, possible_roots)?;

        if context.upper_bound(&self.k) == mandatory_roots {
            // No further roots: the undecided self-loops disappear.
            for node in 0..num_nodes {
                if context.is_arc_in_envelope(self.graph, node, node)
                    && !context.is_arc_in_kernel(self.graph, node, node)
                {
                    context.remove_arc(self.graph, node, node)?;
                    worklist.push(GraphUpdate::ArcRemoved(node, node));
                }
            }
        } else if context.lower_bound(&self.k) == possible_roots {
            // Every candidate root is needed.
            for node in 0..num_nodes {
                if context.is_arc_in_envelope(self.graph, node, node)
                    && !context.is_arc_in_kernel(self.graph, node, node)
                {
                    context.enforce_arc(self.graph, node, node)?;
                    worklist.push(GraphUpdate::ArcEnforced(node, node));
                }
            }
        }
        Ok(())
    }

    /// Every node must reach a potential root by following envelope arcs; the sweep walks
    /// backwards from the potential roots along envelope predecessors.
    fn check_root_reachability(&self, context: &PropagationContextMut) -> PropagationStatusCP {
        let num_nodes = context.num_nodes(self.graph);
        let mut reachable = vec![false; num_nodes];
        let mut stack: Vec<u32> = (0..num_nodes as u32)
            .filter(|&node| context.is_arc_in_envelope(self.graph, node, node))
            .collect();
        for &root in &stack {
            reachable[root as usize] = true;
        }

        while let Some(node) = stack.pop() {
            let predecessors: Vec<u32> = context
                .envelope_predecessors(self.graph, node)
                .filter(|&p| !reachable[p as usize])
                .collect();
            for predecessor in predecessors {
                reachable[predecessor as usize] = true;
                stack.push(predecessor);
            }
        }

        if reachable.iter().any(|&r| !r) {
            return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
        }
        Ok(())
    }
}

impl Propagator for TreePropagator {
    fn name(&self) -> &str {
        "Tree"
    }

    fn priority(&self) -> Priority {
        Priority::Linear
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP {
        assert!(
            context.graph_assignments().is_directed(self.graph),
            "Tree applies to directed graphs"
        );

        let num_nodes = context.num_nodes(self.graph);
        self.chains =
            ReversibleUnionFind::new(num_nodes, |value| context.new_trailed_integer(value));
        self.num_kernel_roots = context.new_trailed_integer(0);

        for tail in 0..num_nodes as u32 {
            for head in context.kernel_successors(self.graph, tail) {
                self.pending.push(GraphUpdate::ArcEnforced(tail, head));
            }
        }
        self.envelope_shrunk = true;

        context.register_graph(self.graph, GraphEvents::ANY_GRAPH, GRAPH_VAR);
        context.register(self.k, DomainEvents::BOUNDS, K_VAR);
        Ok(())
    }

    fn notify_graph(
        &mut self,
        _context: PropagationContextWithTrailedValues,
        _local_id: LocalId,
        update: GraphUpdate,
    ) -> EnqueueDecision {
        match update {
            GraphUpdate::ArcEnforced(_, _) => self.pending.push(update),
            GraphUpdate::ArcRemoved(_, _) | GraphUpdate::NodeRemoved(_) => {
                self.envelope_shrunk = true;
            }
            GraphUpdate::NodeEnforced(_) => {}
        }
        EnqueueDecision::Enqueue
    }

    fn synchronise(&mut self, _context: PropagationContext) {
        self.pending.clear();
        self.envelope_shrunk = true;
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let mut worklist = std::mem::take(&mut self.pending);
        loop {
            while let Some(update) = worklist.pop() {
                match update {
                    GraphUpdate::ArcEnforced(tail, head) => {
                        self.process_enforced_arc(&mut context, tail, head, &mut worklist)?;
                    }
                    GraphUpdate::ArcRemoved(_, _) | GraphUpdate::NodeRemoved(_) => {
                        self.envelope_shrunk = true;
                    }
                    GraphUpdate::NodeEnforced(_) => {}
                }
            }
            // Root filtering may feed the worklist again (forced self-loops); repeat until
            // nothing moves.
            self.filter_roots(&mut context, &mut worklist)?;
            if worklist.is_empty() {
                break;
            }
        }

        if self.envelope_shrunk {
            self.envelope_shrunk = false;
            self.check_root_reachability(&context)?;
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
    fn a_third_mandatory_root_fails_when_k_is_two() {
        let mut solver = TestSolver::default();
        let g = solver.new_directed_graph(4, &complete_arcs(4, true));
        let k = solver.new_variable(2, 2);
        let _ = solver
            .new_propagator(TreePropagator::new(g, k))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 0, 0).expect("feasible");
        solver.enforce_arc_and_propagate(g, 1, 1).expect("feasible");
        assert!(solver.enforce_arc_and_propagate(g, 2, 2).is_err());
    }

    #[test]
    fn reaching_the_root_budget_removes_the_remaining_self_loops() {
        let mut solver = TestSolver::default();
        let g = solver.new_directed_graph(4, &complete_arcs(4, true));
        let k = solver.new_variable(2, 2);
        let _ = solver
            .new_propagator(TreePropagator::new(g, k))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 0, 0).expect("feasible");
        solver.enforce_arc_and_propagate(g, 1, 1).expect("feasible");

        assert!(!solver.is_arc_in_envelope(g, 2, 2));
        assert!(!solver.is_arc_in_envelope(g, 3, 3));
    }

    #[test]
    fn a_root_keeps_no_other_outgoing_arc() {
        let mut solver = TestSolver::default();
        let g = solver.new_directed_graph(3, &complete_arcs(3, true));
        let k = solver.new_variable(1, 3);
        let _ = solver
            .new_propagator(TreePropagator::new(g, k))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 0, 0).expect("feasible");

        assert!(!solver.is_arc_in_envelope(g, 0, 1));
        assert!(!solver.is_arc_in_envelope(g, 0, 2));
    }

    #[test]
    fn a_mandatory_cycle_without_a_self_loop_fails() {
        let mut solver = TestSolver::default();
        let g = solver.new_directed_graph(3, &complete_arcs(3, true));
        let k = solver.new_variable(1, 3);
        let _ = solver
            .new_propagator(TreePropagator::new(g, k))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 0, 1).expect("feasible");
        solver.enforce_arc_and_propagate(g, 1, 2).expect("feasible");
        assert!(solver.enforce_arc_and_propagate(g, 2, 0).is_err());
    }

    #[test]
    fn nodes_that_cannot_reach_a_root_fail() {
        let mut solver = TestSolver::default();
        // Node 2 can only follow 2 -> 1 -> 0, and only node 0 may be a root.
        let g = solver.new_directed_graph(3, &[(0, 0), (1, 0), (2, 1)]);
        let k = solver.new_variable(1, 1);
        let _ = solver
            .new_propagator(TreePropagator::new(g, k))
            .expect("consistent at the root");

        // Cutting node 1 off from the root strands both 1 and 2.
        assert!(solver.remove_arc_and_propagate(g, 1, 0).is_err());
    }
}
