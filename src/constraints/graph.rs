//! The graph constraint factories.

use crate::Solver;
use crate::basic_types::ConstraintOperationError;
use crate::engine::propagation::Propagator;
use crate::options::HeldKarpMode;
use crate::propagators::graph::AllDifferentSuccessorsPropagator;
use crate::propagators::graph::CycleCostPropagator;
use crate::propagators::graph::CycleNoSubtourPropagator;
use crate::propagators::graph::DegreeOrientation;
use crate::propagators::graph::KCliquesPropagator;
use crate::propagators::graph::KConnectedComponentsPropagator;
use crate::propagators::graph::NodeDegreePropagator;
use crate::propagators::graph::OneTreeRelaxationPropagator;
use crate::propagators::graph::PathCostPropagator;
use crate::propagators::graph::PathNoCyclePropagator;
use crate::propagators::graph::TransitivityPropagator;
use crate::propagators::graph::TreePropagator;
use crate::variables::DomainId;
use crate::variables::GraphId;
use super::Constraint;

/// The default subgradient iteration budget of the one-tree relaxation.
const ONE_TREE_ITERATIONS: u32 = 30;

/// The graph must form a Hamiltonian cycle.
///
/// Filtering is incremental and runs in O(1) amortised per enforced or removed edge:
/// degree-two bounds on every node plus the undirected adaptation of the Caseau-Laburthe
/// nocycle constraint for sub-tour elimination.
pub fn hamiltonian_cycle(graph: GraphId) -> impl Constraint {
    HamiltonianCycle { graph }
}

struct HamiltonianCycle {
    graph: GraphId,
}

impl Constraint for HamiltonianCycle {
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError> {
        let num_nodes = solver.graph_num_nodes(self.graph);
        let propagators: Vec<Box<dyn Propagator>> = vec![
            Box::new(NodeDegreePropagator::uniform(
                self.graph,
                DegreeOrientation::Neighbours,
                num_nodes,
                2,
                2,
            )),
            Box::new(CycleNoSubtourPropagator::new(self.graph)),
        ];
        propagators.post(solver)
    }
}

/// The graph must form a Hamiltonian path from `origin` to `destination`.
///
/// Every node has exactly one successor and one predecessor, except the destination (no
/// successor) and the origin (no predecessor); circuits are prevented by the nocycle
/// propagator over the mandatory chains.
pub fn hamiltonian_path(graph: GraphId, origin: u32, destination: u32) -> impl Constraint {
    HamiltonianPath {
        graph,
        origin,
        destination,
    }
}

struct HamiltonianPath {
    graph: GraphId,
    origin: u32,
    destination: u32,
}

impl Constraint for HamiltonianPath {
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError> {
        let num_nodes = solver.graph_num_nodes(self.graph);
        let mut successors = vec![1u32; num_nodes];
        let mut predecessors = vec![1u32; num_nodes];
        successors[self.destination as usize] = 0;
        predecessors[self.origin as usize] = 0;

        let propagators: Vec<Box<dyn Propagator>> = vec![
            Box::new(NodeDegreePropagator::with_bounds(
                self.graph,
                DegreeOrientation::Successors,
                successors.clone(),
                successors,
            )),
            Box::new(NodeDegreePropagator::with_bounds(
                self.graph,
                DegreeOrientation::Predecessors,
                predecessors.clone(),
                predecessors,
            )),
            Box::new(PathNoCyclePropagator::new(
                self.graph,
                self.origin,
                self.destination,
            )),
        ];
        propagators.post(solver)
    }
}

/// The travelling salesman problem: the graph forms a Hamiltonian cycle whose total edge
/// weight is `cost`. `hk_mode` selects whether the Held-Karp one-tree relaxation is posted,
/// and whether it waits for a first solution.
pub fn tsp(
    graph: GraphId,
    cost: DomainId,
    weights: Vec<Vec<i64>>,
    hk_mode: HeldKarpMode,
) -> impl Constraint {
    Tsp {
        graph,
        cost,
        weights,
        hk_mode,
    }
}

struct Tsp {
    graph: GraphId,
    cost: DomainId,
    weights: Vec<Vec<i64>>,
    hk_mode: HeldKarpMode,
}

impl Constraint for Tsp {
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError> {
        hamiltonian_cycle(self.graph).post(solver)?;

        let mut propagators: Vec<Box<dyn Propagator>> = vec![Box::new(CycleCostPropagator::new(
            self.graph,
            self.cost,
            self.weights.clone(),
        ))];
        match self.hk_mode {
            HeldKarpMode::Disabled => {}
            HeldKarpMode::FromRoot => propagators.push(Box::new(
                OneTreeRelaxationPropagator::new(
                    self.graph,
                    self.cost,
                    self.weights,
                    ONE_TREE_ITERATIONS,
                    false,
                ),
            )),
            HeldKarpMode::AfterFirstSolution => propagators.push(Box::new(
                OneTreeRelaxationPropagator::new(
                    self.graph,
                    self.cost,
                    self.weights,
                    ONE_TREE_ITERATIONS,
                    true,
                ),
            )),
        }
        propagators.post(solver)
    }
}

/// The asymmetric travelling salesman problem expressed as a minimum-cost Hamiltonian path
/// from `origin` to `destination`.
pub fn atsp(
    graph: GraphId,
    cost: DomainId,
    weights: Vec<Vec<i64>>,
    origin: u32,
    destination: u32,
) -> impl Constraint {
    Atsp {
        graph,
        cost,
        weights,
        origin,
        destination,
    }
}

struct Atsp {
    graph: GraphId,
    cost: DomainId,
    weights: Vec<Vec<i64>>,
    origin: u32,
    destination: u32,
}

impl Constraint for Atsp {
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError> {
        hamiltonian_path(self.graph, self.origin, self.destination).post(solver)?;
        PathCostPropagator::new(self.graph, self.cost, self.weights, self.destination)
            .post(solver)
    }
}

/// Partition the graph into `k` cliques: transitivity closes mandatory components into
/// cliques, the clique check rejects components that can no longer be completed, and the
/// component counting pins `k` between the forced and the possible component counts.
pub fn n_cliques(graph: GraphId, k: DomainId) -> impl Constraint {
    NCliques { graph, k }
}

struct NCliques {
    graph: GraphId,
    k: DomainId,
}

impl Constraint for NCliques {
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError> {
        let propagators: Vec<Box<dyn Propagator>> = vec![
            Box::new(TransitivityPropagator::new(self.graph)),
            Box::new(KCliquesPropagator::new(self.graph, self.k)),
            Box::new(KConnectedComponentsPropagator::new(self.graph, self.k)),
        ];
        propagators.post(solver)
    }
}

/// Partition the directed graph into `k` anti-arborescences; roots are identified by
/// self-loops and every node owns exactly one outgoing arc. Every node is assumed to be part
/// of the solution graph.
pub fn n_trees(graph: GraphId, k: DomainId) -> impl Constraint {
    NTrees { graph, k }
}

struct NTrees {
    graph: GraphId,
    k: DomainId,
}

impl Constraint for NTrees {
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError> {
        let num_nodes = solver.graph_num_nodes(self.graph);
        let propagators: Vec<Box<dyn Propagator>> = vec![
            Box::new(NodeDegreePropagator::uniform(
                self.graph,
                DegreeOrientation::Successors,
                num_nodes,
                1,
                1,
            )),
            Box::new(TreePropagator::new(self.graph, self.k)),
        ];
        propagators.post(solver)
    }
}

/// Redundant arc-consistent filtering requiring all successors of a directed tour graph to
/// be distinct; posted on top of [`atsp`] through the `alldiff_ac` option.
pub fn successors_all_different(graph: GraphId) -> impl Constraint {
    AllDifferentSuccessorsPropagator::new(graph)
}
