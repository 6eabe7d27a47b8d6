use std::time::Duration;

/// Whether the objective is to be minimised or maximised.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimisationDirection {
    Minimise,
    Maximise,
}

/// When the Held-Karp one-tree relaxation is active in a [`tsp`](crate::constraints::tsp)
/// constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HeldKarpMode {
    /// No relaxation.
    #[default]
    Disabled,
    /// Active from the root of the search.
    FromRoot,
    /// Active only once a first solution exists, to amortise its cost.
    AfterFirstSolution,
}

/// How fractional distances are rounded to integer edge weights (TSPLIB-style instances).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RoundingMode {
    Floor,
    #[default]
    Round,
    Ceil,
}

/// Configuration of the solver.
#[derive(Clone, Debug)]
pub struct SolverOptions {
    /// The Held-Karp activation mode used by model helpers.
    pub hk_mode: HeldKarpMode,
    /// Whether to post the redundant arc-consistent successor alldifferent on directed tour
    /// models.
    pub alldiff_ac: bool,
    /// Wall-clock budget for a search call.
    pub time_limit: Option<Duration>,
    /// Maximum number of conflicts for a search call.
    pub conflict_limit: Option<u64>,
    /// Maximum number of solutions to enumerate.
    pub solution_limit: Option<u64>,
    /// Restart from the root after every incumbent during optimisation.
    pub restart_on_solution: bool,
    /// Rounding used when deriving integer weight matrices from coordinates.
    pub rounding_mode: RoundingMode,
    /// Seed for the randomised branchers.
    pub random_seed: u64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            hk_mode: HeldKarpMode::default(),
            alldiff_ac: false,
            time_limit: None,
            conflict_limit: None,
            solution_limit: None,
            restart_on_solution: false,
            rounding_mode: RoundingMode::default(),
            random_seed: 42,
        }
    }
}
