use crate::engine::cp::Assignments;
use crate::engine::cp::GraphAssignments;
use crate::variables::GraphId;
use crate::variables::IntegerVariable;

/// The read-only view of the solver state available to a [`Brancher`](super::Brancher) when it
/// picks the next decision.
#[derive(Debug)]
pub struct SelectionContext<'a> {
    assignments: &'a Assignments,
    graphs: &'a GraphAssignments,
}

impl<'a> SelectionContext<'a> {
    pub(crate) fn new(assignments: &'a Assignments, graphs: &'a GraphAssignments) -> Self {
        SelectionContext {
            assignments,
            graphs,
        }
    }

    pub fn lower_bound<Var: IntegerVariable>(&self, var: &Var) -> i32 {
        var.lower_bound(self.assignments)
    }

    pub fn upper_bound<Var: IntegerVariable>(&self, var: &Var) -> i32 {
        var.upper_bound(self.assignments)
    }

    pub fn is_assigned<Var: IntegerVariable>(&self, var: &Var) -> bool {
        self.lower_bound(var) == self.upper_bound(var)
    }

    pub fn domain_size<Var: IntegerVariable>(&self, var: &Var) -> u64 {
        (self.upper_bound(var) as i64 - self.lower_bound(var) as i64 + 1) as u64
    }

    pub fn num_nodes(&self, graph: GraphId) -> usize {
        self.graphs.num_nodes(graph)
    }

    pub fn is_graph_directed(&self, graph: GraphId) -> bool {
        self.graphs.is_directed(graph)
    }

    pub fn is_arc_in_kernel(&self, graph: GraphId, from: u32, to: u32) -> bool {
        self.graphs.is_arc_in_kernel(graph, from, to)
    }

    pub fn is_arc_in_envelope(&self, graph: GraphId, from: u32, to: u32) -> bool {
        self.graphs.is_arc_in_envelope(graph, from, to)
    }

    pub fn envelope_successors(&self, graph: GraphId, node: u32) -> impl Iterator<Item = u32> + '_ {
        self.graphs.envelope_successors(graph, node)
    }

    pub fn is_graph_assigned(&self, graph: GraphId) -> bool {
        self.graphs.is_assigned(graph)
    }
}
