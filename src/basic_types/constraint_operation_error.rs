use thiserror::Error;

#[cfg(doc)]
use crate::Solver;

/// Errors related to adding constraints and creating variables through the [`Solver`]. These
/// indicate misuse of the API and are surfaced immediately; the search is not started.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConstraintOperationError {
    /// Adding a propagator led to infeasibility at the root.
    #[error("adding the constraint failed because it is infeasible at the root")]
    InfeasiblePropagator,
    /// A constraint was added while the [`Solver`] was already in an infeasible state.
    #[error("adding the constraint failed because the solver is in an infeasible state")]
    InfeasibleState,
    /// A variable was created with an invalid domain.
    #[error("the domain [{lower_bound}, {upper_bound}] is empty")]
    InvalidDomain { lower_bound: i32, upper_bound: i32 },
    /// A constraint was added after the search had started.
    #[error("constraints can only be added at the root")]
    NotAtRoot,
}
