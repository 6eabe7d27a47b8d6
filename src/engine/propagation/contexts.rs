use enumset::EnumSet;

use crate::basic_types::Cause;
use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::Assignments;
use crate::engine::cp::GraphAssignments;
use crate::engine::cp::TrailedInt;
use crate::engine::cp::TrailedValues;
use crate::engine::cp::WatchListCp;
use crate::engine::cp::Watchers;
use crate::engine::cp::domain_events::GraphEvent;
use crate::engine::cp::domain_events::IntEvent;
use crate::variables::GraphId;
use crate::variables::IntegerVariable;
use super::LocalId;
use super::PropagatorId;
use super::PropagatorVarId;

/// Read access to the domain stores, shared by every context through blanket methods.
pub(crate) trait ReadDomains {
    fn assignments(&self) -> &Assignments;
    fn graph_assignments(&self) -> &GraphAssignments;
    /// The number of solutions found so far in the current search; lets propagators such as
    /// the one-tree relaxation defer their work until a first solution exists.
    fn solution_count(&self) -> u64;

    fn lower_bound<Var: IntegerVariable>(&self, var: &Var) -> i32 {
        var.lower_bound(self.assignments())
    }

    fn upper_bound<Var: IntegerVariable>(&self, var: &Var) -> i32 {
        var.upper_bound(self.assignments())
    }

    fn contains<Var: IntegerVariable>(&self, var: &Var, value: i32) -> bool {
        var.contains(self.assignments(), value)
    }

    fn is_assigned<Var: IntegerVariable>(&self, var: &Var) -> bool {
        var.lower_bound(self.assignments()) == var.upper_bound(self.assignments())
    }

    fn num_nodes(&self, graph: GraphId) -> usize {
        self.graph_assignments().num_nodes(graph)
    }

    fn is_node_in_kernel(&self, graph: GraphId, node: u32) -> bool {
        self.graph_assignments().is_node_in_kernel(graph, node)
    }

    fn is_node_in_envelope(&self, graph: GraphId, node: u32) -> bool {
        self.graph_assignments().is_node_in_envelope(graph, node)
    }

    fn is_arc_in_kernel(&self, graph: GraphId, from: u32, to: u32) -> bool {
        self.graph_assignments().is_arc_in_kernel(graph, from, to)
    }

    fn is_arc_in_envelope(&self, graph: GraphId, from: u32, to: u32) -> bool {
        self.graph_assignments().is_arc_in_envelope(graph, from, to)
    }

    fn kernel_successors(&self, graph: GraphId, node: u32) -> impl Iterator<Item = u32> + '_ {
        self.graph_assignments().kernel_successors(graph, node)
    }

    fn kernel_predecessors(&self, graph: GraphId, node: u32) -> impl Iterator<Item = u32> + '_ {
        self.graph_assignments().kernel_predecessors(graph, node)
    }

    fn envelope_successors(&self, graph: GraphId, node: u32) -> impl Iterator<Item = u32> + '_ {
        self.graph_assignments().envelope_successors(graph, node)
    }

    fn envelope_predecessors(&self, graph: GraphId, node: u32) -> impl Iterator<Item = u32> + '_ {
        self.graph_assignments().envelope_predecessors(graph, node)
    }

    fn kernel_out_degree(&self, graph: GraphId, node: u32) -> u32 {
        self.graph_assignments().kernel_out_degree(graph, node)
    }

    fn kernel_in_degree(&self, graph: GraphId, node: u32) -> u32 {
        self.graph_assignments().kernel_in_degree(graph, node)
    }

    fn envelope_out_degree(&self, graph: GraphId, node: u32) -> u32 {
        self.graph_assignments().envelope_out_degree(graph, node)
    }

    fn envelope_in_degree(&self, graph: GraphId, node: u32) -> u32 {
        self.graph_assignments().envelope_in_degree(graph, node)
    }

    fn num_kernel_arcs(&self, graph: GraphId) -> usize {
        self.graph_assignments().num_kernel_arcs(graph)
    }

    fn num_envelope_arcs(&self, graph: GraphId) -> usize {
        self.graph_assignments().num_envelope_arcs(graph)
    }

    fn num_kernel_nodes(&self, graph: GraphId) -> usize {
        self.graph_assignments().num_kernel_nodes(graph)
    }

    fn num_envelope_nodes(&self, graph: GraphId) -> usize {
        self.graph_assignments().num_envelope_nodes(graph)
    }

    fn is_graph_assigned(&self, graph: GraphId) -> bool {
        self.graph_assignments().is_assigned(graph)
    }
}

/// Read/write access to the reversible cells of [`TrailedValues`].
pub(crate) trait ManipulateTrailedValues {
    fn value(&self, cell: TrailedInt) -> i64;
    fn assign(&mut self, cell: TrailedInt, value: i64);
    fn add_assign(&mut self, cell: TrailedInt, addition: i64);
}

/// Read-only view of the solver state, handed to `synchronise`, `is_entailed` and `why`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PropagationContext<'a> {
    assignments: &'a Assignments,
    graphs: &'a GraphAssignments,
    solution_count: u64,
}

impl<'a> PropagationContext<'a> {
    pub(crate) fn new(
        assignments: &'a Assignments,
        graphs: &'a GraphAssignments,
        solution_count: u64,
    ) -> Self {
        PropagationContext {
            assignments,
            graphs,
            solution_count,
        }
    }
}

impl ReadDomains for PropagationContext<'_> {
    fn assignments(&self) -> &Assignments {
        self.assignments
    }

    fn graph_assignments(&self) -> &GraphAssignments {
        self.graphs
    }

    fn solution_count(&self) -> u64 {
        self.solution_count
    }
}

/// The context handed to `notify`: reads plus access to the propagator's trailed state. It
/// deliberately has no domain mutators; notifications do cheap bookkeeping, the filtering
/// itself happens in `propagate`.
#[derive(Debug)]
pub(crate) struct PropagationContextWithTrailedValues<'a> {
    trailed_values: &'a mut TrailedValues,
    assignments: &'a Assignments,
    graphs: &'a GraphAssignments,
    solution_count: u64,
}

impl<'a> PropagationContextWithTrailedValues<'a> {
    pub(crate) fn new(
        trailed_values: &'a mut TrailedValues,
        assignments: &'a Assignments,
        graphs: &'a GraphAssignments,
        solution_count: u64,
    ) -> Self {
        PropagationContextWithTrailedValues {
            trailed_values,
            assignments,
            graphs,
            solution_count,
        }
    }

    pub(crate) fn as_readonly(&self) -> PropagationContext<'_> {
        PropagationContext::new(self.assignments, self.graphs, self.solution_count)
    }
}

impl ReadDomains for PropagationContextWithTrailedValues<'_> {
    fn assignments(&self) -> &Assignments {
        self.assignments
    }

    fn graph_assignments(&self) -> &GraphAssignments {
        self.graphs
    }

    fn solution_count(&self) -> u64 {
        self.solution_count
    }
}

impl ManipulateTrailedValues for PropagationContextWithTrailedValues<'_> {
    fn value(&self, cell: TrailedInt) -> i64 {
        self.trailed_values.read(cell)
    }

    fn assign(&mut self, cell: TrailedInt, value: i64) {
        self.trailed_values.assign(cell, value)
    }

    fn add_assign(&mut self, cell: TrailedInt, addition: i64) {
        self.trailed_values.add_assign(cell, addition)
    }
}

/// The context handed to `propagate`: reads, trailed state, and the domain mutators. Every
/// mutation is attributed to the running propagator, which suppresses its own re-notification
/// and feeds the explanation sink.
#[derive(Debug)]
pub(crate) struct PropagationContextMut<'a> {
    trailed_values: &'a mut TrailedValues,
    assignments: &'a mut Assignments,
    graphs: &'a mut GraphAssignments,
    propagator_id: PropagatorId,
    active_flag: TrailedInt,
    solution_count: u64,
}

impl<'a> PropagationContextMut<'a> {
    pub(crate) fn new(
        trailed_values: &'a mut TrailedValues,
        assignments: &'a mut Assignments,
        graphs: &'a mut GraphAssignments,
        propagator_id: PropagatorId,
        active_flag: TrailedInt,
        solution_count: u64,
    ) -> Self {
        PropagationContextMut {
            trailed_values,
            assignments,
            graphs,
            propagator_id,
            active_flag,
            solution_count,
        }
    }

    fn cause(&self) -> Cause {
        Cause::Propagator(self.propagator_id)
    }

    pub(crate) fn as_readonly(&self) -> PropagationContext<'_> {
        PropagationContext::new(self.assignments, self.graphs, self.solution_count)
    }

    /// Marks the propagator as entailed: it will not be scheduled or run again until the trail
    /// is popped past this point.
    pub(crate) fn set_passive(&mut self) {
        self.trailed_values.assign(self.active_flag, 0);
    }

    pub(crate) fn set_lower_bound<Var: IntegerVariable>(
        &mut self,
        var: &Var,
        bound: i32,
    ) -> PropagationStatusCP {
        var.set_lower_bound(self.assignments, bound, self.cause())
    }

    pub(crate) fn set_upper_bound<Var: IntegerVariable>(
        &mut self,
        var: &Var,
        bound: i32,
    ) -> PropagationStatusCP {
        var.set_upper_bound(self.assignments, bound, self.cause())
    }

    pub(crate) fn remove_value<Var: IntegerVariable>(
        &mut self,
        var: &Var,
        value: i32,
    ) -> PropagationStatusCP {
        var.remove_value(self.assignments, value, self.cause())
    }

    pub(crate) fn instantiate_to<Var: IntegerVariable>(
        &mut self,
        var: &Var,
        value: i32,
    ) -> PropagationStatusCP {
        var.instantiate_to(self.assignments, value, self.cause())
    }

    pub(crate) fn enforce_arc(
        &mut self,
        graph: GraphId,
        from: u32,
        to: u32,
    ) -> PropagationStatusCP {
        let cause = self.cause();
        self.graphs.enforce_arc(graph, from, to, cause)
    }

    pub(crate) fn remove_arc(
        &mut self,
        graph: GraphId,
        from: u32,
        to: u32,
    ) -> PropagationStatusCP {
        let cause = self.cause();
        self.graphs.remove_arc(graph, from, to, cause)
    }

    pub(crate) fn enforce_node(&mut self, graph: GraphId, node: u32) -> PropagationStatusCP {
        let cause = self.cause();
        self.graphs.enforce_node(graph, node, cause)
    }

    pub(crate) fn remove_node(&mut self, graph: GraphId, node: u32) -> PropagationStatusCP {
        let cause = self.cause();
        self.graphs.remove_node(graph, node, cause)
    }
}

impl ReadDomains for PropagationContextMut<'_> {
    fn assignments(&self) -> &Assignments {
        self.assignments
    }

    fn graph_assignments(&self) -> &GraphAssignments {
        self.graphs
    }

    fn solution_count(&self) -> u64 {
        self.solution_count
    }
}

impl ManipulateTrailedValues for PropagationContextMut<'_> {
    fn value(&self, cell: TrailedInt) -> i64 {
        self.trailed_values.read(cell)
    }

    fn assign(&mut self, cell: TrailedInt, value: i64) {
        self.trailed_values.assign(cell, value)
    }

    fn add_assign(&mut self, cell: TrailedInt, addition: i64) {
        self.trailed_values.add_assign(cell, addition)
    }
}

/// The context handed to `initialise_at_root`: registration of subscriptions, creation of
/// trailed cells, and read access for setting up initial state.
#[derive(Debug)]
pub(crate) struct PropagatorInitialisationContext<'a> {
    watch_list: &'a mut WatchListCp,
    trailed_values: &'a mut TrailedValues,
    propagator_id: PropagatorId,
    assignments: &'a Assignments,
    graphs: &'a GraphAssignments,
}

impl<'a> PropagatorInitialisationContext<'a> {
    pub(crate) fn new(
        watch_list: &'a mut WatchListCp,
        trailed_values: &'a mut TrailedValues,
        propagator_id: PropagatorId,
        assignments: &'a Assignments,
        graphs: &'a GraphAssignments,
    ) -> Self {
        PropagatorInitialisationContext {
            watch_list,
            trailed_values,
            propagator_id,
            assignments,
            graphs,
        }
    }

    pub(crate) fn register<Var: IntegerVariable>(
        &mut self,
        var: Var,
        events: EnumSet<IntEvent>,
        local_id: LocalId,
    ) {
        let propagator_var = PropagatorVarId {
            propagator: self.propagator_id,
            variable: local_id,
        };
        let mut watchers = Watchers::new(propagator_var, self.watch_list);
        var.watch_all(&mut watchers, events);
    }

    pub(crate) fn register_graph(
        &mut self,
        graph: GraphId,
        events: EnumSet<GraphEvent>,
        local_id: LocalId,
    ) {
        let propagator_var = PropagatorVarId {
            propagator: self.propagator_id,
            variable: local_id,
        };
        self.watch_list.watch_graph(graph, events, propagator_var);
    }

    pub(crate) fn new_trailed_integer(&mut self, initial_value: i64) -> TrailedInt {
        self.trailed_values.grow(initial_value)
    }
}

impl ReadDomains for PropagatorInitialisationContext<'_> {
    fn assignments(&self) -> &Assignments {
        self.assignments
    }

    fn graph_assignments(&self) -> &GraphAssignments {
        self.graphs
    }

    fn solution_count(&self) -> u64 {
        0
    }
}

impl ManipulateTrailedValues for PropagatorInitialisationContext<'_> {
    fn value(&self, cell: TrailedInt) -> i64 {
        self.trailed_values.read(cell)
    }

    fn assign(&mut self, cell: TrailedInt, value: i64) {
        self.trailed_values.assign(cell, value)
    }

    fn add_assign(&mut self, cell: TrailedInt, addition: i64) {
        self.trailed_values.add_assign(cell, addition)
    }
}
