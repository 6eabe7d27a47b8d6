//! Defines the constraints the solver provides out of the box.
//!
//! A constraint is a relation over variables, enforced through one or more propagators; a
//! factory in this module builds that collection and posting it attaches the propagators and
//! runs their initial propagation.

mod constraint_poster;
mod graph;

pub use constraint_poster::ConstraintPoster;
pub use graph::atsp;
pub use graph::hamiltonian_cycle;
pub use graph::hamiltonian_path;
pub use graph::n_cliques;
pub use graph::n_trees;
pub use graph::successors_all_different;
pub use graph::tsp;

use crate::Solver;
use crate::basic_types::ConstraintOperationError;
use crate::engine::propagation::Propagator;

/// A [`Constraint`] is a relation over variables. It disqualifies certain partial assignments
/// of making it into a solution of the problem.
pub trait Constraint {
    /// Add the [`Constraint`] to the [`Solver`].
    ///
    /// This method returns a [`ConstraintOperationError`] if the addition of the
    /// [`Constraint`] led to a root-level conflict.
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError>;
}

impl<ConcretePropagator> Constraint for ConcretePropagator
where
    ConcretePropagator: Propagator + 'static,
{
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError> {
        solver.add_propagator(self)
    }
}

impl Constraint for Box<dyn Propagator> {
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError> {
        solver.add_boxed_propagator(self)
    }
}

impl<C: Constraint> Constraint for Vec<C> {
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError> {
        self.into_iter()
            .try_for_each(|constraint| constraint.post(solver))
    }
}
