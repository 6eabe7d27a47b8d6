//! Helpers for testing propagators: a [`TestSolver`] sets up specific scenarios and drives
//! the engine directly, without a search loop.

use crate::basic_types::Cause;
use crate::basic_types::ConstraintOperationError;
use crate::basic_types::PropagationStatusCP;
use crate::engine::ConstraintSatisfactionSolver;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorId;
use crate::variables::DomainId;
use crate::variables::GraphId;
use crate::variables::IntegerVariable;

#[derive(Debug, Default)]
pub(crate) struct TestSolver {
    pub(crate) solver: ConstraintSatisfactionSolver,
}

impl TestSolver {
    pub(crate) fn new_variable(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        self.solver.create_new_integer_variable(lower_bound, upper_bound)
    }

    pub(crate) fn new_undirected_graph(&mut self, num_nodes: usize, edges: &[(u32, u32)]) -> GraphId {
        self.solver.create_new_graph_variable(num_nodes, false, edges)
    }

    pub(crate) fn new_directed_graph(&mut self, num_nodes: usize, arcs: &[(u32, u32)]) -> GraphId {
        self.solver.create_new_graph_variable(num_nodes, true, arcs)
    }

    /// Posts the propagator and runs the initial propagation to the fixed point.
    pub(crate) fn new_propagator(
        &mut self,
        propagator: impl Propagator + 'static,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        self.solver.add_propagator(propagator)
    }

    pub(crate) fn propagate(&mut self) -> PropagationStatusCP {
        self.solver.propagate_to_fixed_point()
    }

    pub(crate) fn increase_decision_level(&mut self) {
        self.solver.declare_new_decision_level();
    }

    pub(crate) fn backtrack_to(&mut self, decision_level: usize) {
        self.solver.backtrack(decision_level);
    }

    pub(crate) fn set_lower_bound_and_propagate(
        &mut self,
        domain: DomainId,
        bound: i32,
    ) -> PropagationStatusCP {
        self.solver
            .assignments
            .tighten_lower_bound(domain, bound, Cause::Search)?;
        self.propagate()
    }

    pub(crate) fn set_upper_bound_and_propagate(
        &mut self,
        domain: DomainId,
        bound: i32,
    ) -> PropagationStatusCP {
        self.solver
            .assignments
            .tighten_upper_bound(domain, bound, Cause::Search)?;
        self.propagate()
    }

    pub(crate) fn enforce_arc_and_propagate(
        &mut self,
        graph: GraphId,
        from: u32,
        to: u32,
    ) -> PropagationStatusCP {
        self.solver.graphs.enforce_arc(graph, from, to, Cause::Search)?;
        self.propagate()
    }

    pub(crate) fn remove_arc_and_propagate(
        &mut self,
        graph: GraphId,
        from: u32,
        to: u32,
    ) -> PropagationStatusCP {
        self.solver.graphs.remove_arc(graph, from, to, Cause::Search)?;
        self.propagate()
    }

    pub(crate) fn lower_bound(&self, domain: DomainId) -> i32 {
        domain.lower_bound(&self.solver.assignments)
    }

    pub(crate) fn upper_bound(&self, domain: DomainId) -> i32 {
        domain.upper_bound(&self.solver.assignments)
    }

    pub(crate) fn assert_bounds(&self, domain: DomainId, lower_bound: i32, upper_bound: i32) {
        assert_eq!(
            (lower_bound, upper_bound),
            (self.lower_bound(domain), self.upper_bound(domain)),
            "expected bounds [{lower_bound}, {upper_bound}] for {domain}"
        );
    }

    pub(crate) fn is_arc_in_kernel(&self, graph: GraphId, from: u32, to: u32) -> bool {
        self.solver.graphs.is_arc_in_kernel(graph, from, to)
    }

    pub(crate) fn is_arc_in_envelope(&self, graph: GraphId, from: u32, to: u32) -> bool {
        self.solver.graphs.is_arc_in_envelope(graph, from, to)
    }

    pub(crate) fn is_graph_assigned(&self, graph: GraphId) -> bool {
        self.solver.graphs.is_assigned(graph)
    }
}
