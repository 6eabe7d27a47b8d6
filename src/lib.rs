//! # Marrow
//! Marrow is a constraint programming solver with first-class graph variables. It couples an
//! event-driven propagation engine over a trailed (reversible) state model with a
//! backtracking search, and ships the graph filtering algorithms that make the combination
//! worthwhile: Hamiltonian cycles and paths, clique and tree partitioning, and the Held-Karp
//! one-tree relaxation with marginal-cost filtering for travelling salesman models.
//!
//! A graph variable is a pair of graphs over the same nodes: the *kernel* of mandatory nodes
//! and arcs, and the *envelope* of possible ones. Propagators grow the kernel and shrink the
//! envelope until they meet, at which point the variable is instantiated.
//!
//! # Using Marrow
//! The first step to solving a problem is creating the variables:
//! ```rust
//! # use marrow_solver::Solver;
//! # use marrow_solver::variables::edge_sets::complete_edges;
//! let mut solver = Solver::default();
//!
//! let graph = solver.new_undirected_graph(4, &complete_edges(4));
//! let cost = solver.new_bounded_integer(0, 100).unwrap();
//! ```
//!
//! Then constraints are posted:
//! ```rust
//! # use marrow_solver::Solver;
//! # use marrow_solver::constraints;
//! # use marrow_solver::options::HeldKarpMode;
//! # use marrow_solver::variables::edge_sets::complete_edges;
//! # let mut solver = Solver::default();
//! # let graph = solver.new_undirected_graph(4, &complete_edges(4));
//! # let cost = solver.new_bounded_integer(0, 100).unwrap();
//! let weights = vec![vec![1; 4]; 4];
//! solver
//!     .add_constraint(constraints::tsp(graph, cost, weights, HeldKarpMode::FromRoot))
//!     .post()
//!     .expect("the model is consistent");
//! ```
//!
//! Finding an optimal tour takes a branching strategy and a termination condition:
//! ```rust
//! # use marrow_solver::Solver;
//! # use marrow_solver::constraints;
//! # use marrow_solver::branching::branchers::FirstEnvelopeArcBrancher;
//! # use marrow_solver::options::{HeldKarpMode, OptimisationDirection};
//! # use marrow_solver::results::OptimisationResult;
//! # use marrow_solver::termination::Indefinite;
//! # use marrow_solver::variables::edge_sets::complete_edges;
//! # let mut solver = Solver::default();
//! # let graph = solver.new_undirected_graph(4, &complete_edges(4));
//! # let cost = solver.new_bounded_integer(0, 100).unwrap();
//! # let weights = vec![vec![1; 4]; 4];
//! # solver
//! #     .add_constraint(constraints::tsp(graph, cost, weights, HeldKarpMode::Disabled))
//! #     .post()
//! #     .expect("the model is consistent");
//! let mut brancher = FirstEnvelopeArcBrancher::new(graph);
//! let mut termination = Indefinite;
//!
//! let result = solver.optimise(
//!     &mut brancher,
//!     &mut termination,
//!     OptimisationDirection::Minimise,
//!     cost,
//! );
//!
//! if let OptimisationResult::Optimal(solution) = result {
//!     assert_eq!(solution.integer_value(&cost), 4);
//! } else {
//!     panic!("a complete graph always has a tour");
//! }
//! ```

pub(crate) mod api;
pub(crate) mod basic_types;
pub mod branching;
pub mod constraints;
pub(crate) mod containers;
pub(crate) mod engine;
#[doc(hidden)]
pub mod marrow_asserts;
pub mod options;
pub(crate) mod propagators;
pub(crate) mod statistics;
pub mod termination;
pub mod variables;
pub mod weights;

pub use api::solver::Solver;
pub use basic_types::Cause;
pub use basic_types::Conflict;
pub use basic_types::ConflictReason;
pub use basic_types::ConstraintOperationError;
pub use basic_types::VariableRef;
pub use engine::cp::Assignments;
pub use engine::cp::GraphAssignments;
pub use engine::cp::GraphEvent;
pub use engine::cp::GraphUpdate;
pub use engine::cp::IntEvent;
pub use engine::cp::Watchers;
pub use engine::explanation::ExplanationSink;
pub use engine::explanation::NoopExplanations;
pub use engine::explanation::RecordedChange;
pub use engine::explanation::RecordedExplanations;
pub use engine::explanation::RecordedUpdate;
pub use engine::propagation::PropagatorId;
pub use statistics::SolverStatistics;

/// The result types returned by the solving entry points.
pub mod results {
    pub use crate::api::outputs::EnumerationResult;
    pub use crate::api::outputs::GraphSolution;
    pub use crate::api::outputs::OptimisationResult;
    pub use crate::api::outputs::SatisfactionResult;
    pub use crate::api::outputs::Solution;
}
