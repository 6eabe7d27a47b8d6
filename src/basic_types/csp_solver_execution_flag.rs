/// The outcome of a single run of the search loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CSPSolverExecutionFlag {
    /// A solution was found; the solver is left at the solution.
    Feasible,
    /// The search space was exhausted without finding a solution.
    Infeasible,
    /// A termination condition tripped before the search concluded.
    Timeout,
}
