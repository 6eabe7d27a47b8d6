use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::domain_events::GraphEvents;
use crate::engine::cp::domain_events::GraphUpdate;
use crate::engine::propagation::EnqueueDecision;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::PropagationContextWithTrailedValues;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::ReadDomains;
use crate::variables::GraphId;

/// Maintains transitivity of an undirected graph: whenever u-v and v-w are mandatory, u-w is
/// mandatory as well. Contrapositively, once u-v is mandatory and u-w has become impossible,
/// v-w is impossible too. Together with the component counting this makes every connected
/// component of the final graph a clique.
///
/// Each event triggers an O(n) closure step over the common third nodes; consequences of the
/// propagator's own reductions are processed inline on a worklist within the same run.
#[derive(Clone, Debug)]
pub(crate) struct TransitivityPropagator {
    graph: GraphId,
    pending: Vec<GraphUpdate>,
}

impl TransitivityPropagator {
    pub(crate) fn new(graph: GraphId) -> Self {
        TransitivityPropagator {
            graph,
            pending: Vec::new(),
        }
    }

    fn close_over_enforced(
        &self,
        context: &mut PropagationContextMut,
        u: u32,
        v: u32,
        worklist: &mut Vec<GraphUpdate>,
    ) -> PropagationStatusCP {
        let num_nodes = context.num_nodes(self.graph) as u32;
        for w in 0..num_nodes {
            if w == u || w == v || !context.is_node_in_envelope(self.graph, w) {
                continue;
            }

            // A mandatory third side closes the triangle.
            if context.is_arc_in_kernel(self.graph, u, w)
                && !context.is_arc_in_kernel(self.graph, v, w)
            {
                context.enforce_arc(self.graph, v, w)?;
                worklist.push(GraphUpdate::ArcEnforced(v.min(w), v.max(w)));
            }
            if context.is_arc_in_kernel(self.graph, v, w)
                && !context.is_arc_in_kernel(self.graph, u, w)
            {
                context.enforce_arc(self.graph, u, w)?;
                worklist.push(GraphUpdate::ArcEnforced(u.min(w), u.max(w)));
            }

            // An impossible third side spreads along the mandatory edge.
            if !context.is_arc_in_envelope(self.graph, u, w)
                && context.is_arc_in_envelope(self.graph, v, w)
            {
                context.remove_arc(self.graph, v, w)?;
                worklist.push(GraphUpdate::ArcRemoved(v.min(w), v.max(w)));
            }
            if !context.is_arc_in_envelope(self.graph, v, w)
                && context.is_arc_in_envelope(self.graph, u, w)
            {
                context.remove_arc(self.graph, u, w)?;
                worklist.push(GraphUpdate::ArcRemoved(u.min(w), u.max(w)));
            }
        }
        Ok(())
    }

    fn close_over_removed(
        &self,
        context: &mut PropagationContextMut,
        u: u32,
        v: u32,
        worklist: &mut Vec<GraphUpdate>,
    ) -> PropagationStatusCP {
        let num_nodes = context.num_nodes(self.graph) as u32;
        for w in 0..num_nodes {
            if w == u || w == v || !context.is_node_in_envelope(self.graph, w) {
                continue;
            }

            // w-u mandatory and u-v impossible: w-v would force u-v, so it is impossible.
            if context.is_arc_in_kernel(self.graph, w, u)
                && context.is_arc_in_envelope(self.graph, w, v)
            {
                context.remove_arc(self.graph, w, v)?;
                worklist.push(GraphUpdate::ArcRemoved(w.min(v), w.max(v)));
            }
            if context.is_arc_in_kernel(self.graph, w, v)
                && context.is_arc_in_envelope(self.graph, w, u)
            {
                context.remove_arc(self.graph, w, u)?;
                worklist.push(GraphUpdate::ArcRemoved(w.min(u), w.max(u)));
            }
        }
        Ok(())
    }
}

impl Propagator for TransitivityPropagator {
    fn name(&self) -> &str {
        "Transitivity"
    }

    fn priority(&self) -> Priority {
        Priority::Linear
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP {
        assert!(
            !context.graph_assignments().is_directed(self.graph),
            "Transitivity applies to undirected graphs"
        );

        let num_nodes = context.num_nodes(self.graph) as u32;
        for u in 0..num_nodes {
            for v in context.kernel_successors(self.graph, u) {
                if u < v {
                    self.pending.push(GraphUpdate::ArcEnforced(u, v));
                }
            }
        }

        context.register_graph(self.graph, GraphEvents::ARCS, LocalId::from(0));
        Ok(())
    }

    fn notify_graph(
        &mut self,
        _context: PropagationContextWithTrailedValues,
        _local_id: LocalId,
        update: GraphUpdate,
    ) -> EnqueueDecision {
        self.pending.push(update);
        EnqueueDecision::Enqueue
    }

    fn synchronise(&mut self, _context: PropagationContext) {
        self.pending.clear();
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let mut worklist = std::mem::take(&mut self.pending);
        while let Some(update) = worklist.pop() {
            match update {
                GraphUpdate::ArcEnforced(u, v) => {
                    self.close_over_enforced(&mut context, u, v, &mut worklist)?
                }
                GraphUpdate::ArcRemoved(u, v) => {
                    self.close_over_removed(&mut context, u, v, &mut worklist)?
                }
                GraphUpdate::NodeEnforced(_) | GraphUpdate::NodeRemoved(_) => {}
            }
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
    fn two_mandatory_sides_close_the_triangle() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(4, &complete_edges(4));
        let _ = solver
            .new_propagator(TransitivityPropagator::new(g))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 0, 1).expect("feasible");
        solver.enforce_arc_and_propagate(g, 1, 2).expect("feasible");

        assert!(solver.is_arc_in_kernel(g, 0, 2));
    }

    #[test]
    fn an_impossible_side_spreads_along_mandatory_edges() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(4, &complete_edges(4));
        let _ = solver
            .new_propagator(TransitivityPropagator::new(g))
            .expect("consistent at the root");

        solver.remove_arc_and_propagate(g, 0, 2).expect("feasible");
        solver.enforce_arc_and_propagate(g, 0, 1).expect("feasible");

        // 1-2 would put 0 and 2 in the same clique even though 0-2 is impossible.
        assert!(!solver.is_arc_in_envelope(g, 1, 2));
    }

    #[test]
    fn contradictory_closure_fails() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(3, &complete_edges(3));
        let _ = solver
            .new_propagator(TransitivityPropagator::new(g))
            .expect("consistent at the root");

        solver.remove_arc_and_propagate(g, 0, 2).expect("feasible");
        solver.enforce_arc_and_propagate(g, 0, 1).expect("feasible");

        // 1-2 has been removed by the closure, so enforcing it must fail.
        assert!(solver.enforce_arc_and_propagate(g, 1, 2).is_err());
    }
}
