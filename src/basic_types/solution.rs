use crate::variables::DomainId;
use crate::variables::GraphId;
use crate::variables::IntegerVariable;

/// An immutable snapshot of an assignment: every integer variable has a single value and every
/// graph variable has its kernel equal to its envelope.
#[derive(Clone, Debug)]
pub struct Solution {
    integer_values: Vec<i32>,
    graphs: Vec<GraphSolution>,
}

/// The instantiated value of a single graph variable.
#[derive(Clone, Debug)]
pub struct GraphSolution {
    pub(crate) num_nodes: usize,
    pub(crate) directed: bool,
    pub(crate) nodes: Vec<u32>,
    /// For undirected graphs each edge appears once, with the smaller endpoint first.
    pub(crate) arcs: Vec<(u32, u32)>,
}

impl Solution {
    pub(crate) fn new(integer_values: Vec<i32>, graphs: Vec<GraphSolution>) -> Self {
        Solution {
            integer_values,
            graphs,
        }
    }

    /// The value of an integer variable (or view) in this solution.
    pub fn integer_value<Var: IntegerVariable>(&self, variable: &Var) -> i32 {
        variable.value_in(&self.integer_values)
    }

    pub(crate) fn domain_value(&self, domain: DomainId) -> i32 {
        self.integer_values[domain.id as usize]
    }

    /// The arcs (edges) of the graph variable in this solution. Undirected edges appear once,
    /// smaller endpoint first.
    pub fn graph_arcs(&self, graph: GraphId) -> &[(u32, u32)] {
        &self.graphs[graph.id as usize].arcs
    }

    /// The active nodes of the graph variable in this solution.
    pub fn graph_nodes(&self, graph: GraphId) -> &[u32] {
        &self.graphs[graph.id as usize].nodes
    }

    pub fn is_graph_directed(&self, graph: GraphId) -> bool {
        self.graphs[graph.id as usize].directed
    }

    pub fn graph_num_nodes(&self, graph: GraphId) -> usize {
        self.graphs[graph.id as usize].num_nodes
    }
}
