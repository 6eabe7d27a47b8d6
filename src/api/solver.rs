use std::cell::Cell;
use std::rc::Rc;

use log::debug;

use crate::basic_types::CSPSolverExecutionFlag;
use crate::basic_types::ConstraintOperationError;
use crate::basic_types::Solution;
use crate::branching::Brancher;
use crate::branching::branchers::RandomArcBrancher;
use crate::constraints::ConstraintPoster;
use crate::engine::ConstraintSatisfactionSolver;
use crate::engine::explanation::ExplanationSink;
use crate::engine::propagation::Propagator;
use crate::options::OptimisationDirection;
use crate::options::SolverOptions;
use crate::propagators::ObjectiveCutPropagator;
use crate::statistics::SolverStatistics;
use crate::termination::Combinator;
use crate::termination::ConflictBudget;
use crate::termination::TerminationCondition;
use crate::termination::TimeBudget;
use crate::variables::DomainId;
use crate::variables::GraphId;
use crate::variables::IntegerVariable;
use crate::variables::Literal;
use super::outputs::EnumerationResult;
use super::outputs::OptimisationResult;
use super::outputs::SatisfactionResult;

/// The entry point: creates variables, posts constraints, and drives the search.
#[derive(Debug)]
pub struct Solver {
    csp: ConstraintSatisfactionSolver,
    options: SolverOptions,
}

impl Default for Solver {
    fn default() -> Self {
        Solver::with_options(SolverOptions::default())
    }
}

impl Solver {
    pub fn with_options(options: SolverOptions) -> Self {
        Solver {
            csp: ConstraintSatisfactionSolver::default(),
            options,
        }
    }

    /// Replaces the explanation sink; records are only meaningful for searches run after the
    /// replacement.
    pub fn with_explanation_sink(options: SolverOptions, sink: Box<dyn ExplanationSink>) -> Self {
        Solver {
            csp: ConstraintSatisfactionSolver::with_explanation_sink(sink),
            options,
        }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn statistics(&self) -> &SolverStatistics {
        &self.csp.statistics
    }

    pub fn log_statistics(&self) {
        self.csp.statistics.log_statistics();
    }
}

// Variable creation.
impl Solver {
    /// Create a new integer variable with a bounded (interval) domain.
    pub fn new_bounded_integer(
        &mut self,
        lower_bound: i32,
        upper_bound: i32,
    ) -> Result<DomainId, ConstraintOperationError> {
        if lower_bound > upper_bound {
            return Err(ConstraintOperationError::InvalidDomain {
                lower_bound,
                upper_bound,
            });
        }
        Ok(self.csp.create_new_integer_variable(lower_bound, upper_bound))
    }

    /// Create a new integer variable with an enumerated domain holding exactly the given
    /// values.
    pub fn new_sparse_integer(&mut self, values: impl Into<Vec<i32>>) -> DomainId {
        self.csp.create_new_integer_variable_sparse(values.into())
    }

    /// Create a new boolean variable.
    pub fn new_literal(&mut self) -> Literal {
        Literal::new(self.csp.create_new_integer_variable(0, 1))
    }

    /// Create a new undirected graph variable over `num_nodes` mandatory nodes with the given
    /// possible edges.
    pub fn new_undirected_graph(&mut self, num_nodes: usize, edges: &[(u32, u32)]) -> GraphId {
        self.csp.create_new_graph_variable(num_nodes, false, edges)
    }

    /// Create a new directed graph variable over `num_nodes` mandatory nodes with the given
    /// possible arcs.
    pub fn new_directed_graph(&mut self, num_nodes: usize, arcs: &[(u32, u32)]) -> GraphId {
        self.csp.create_new_graph_variable(num_nodes, true, arcs)
    }

    pub fn graph_num_nodes(&self, graph: GraphId) -> usize {
        self.csp.graphs.num_nodes(graph)
    }

    /// Makes an arc mandatory while building the model, before search starts, and runs the
    /// propagation this triggers. Fails if doing so is inconsistent with what has been posted.
    pub fn enforce_arc(
        &mut self,
        graph: GraphId,
        from: u32,
        to: u32,
    ) -> Result<(), ConstraintOperationError> {
        self.csp.root_level_enforce_arc(graph, from, to)
    }

    /// Removes an arc from the envelope while building the model, before search starts.
    pub fn remove_arc(
        &mut self,
        graph: GraphId,
        from: u32,
        to: u32,
    ) -> Result<(), ConstraintOperationError> {
        self.csp.root_level_remove_arc(graph, from, to)
    }

    pub fn lower_bound<Var: IntegerVariable>(&self, var: &Var) -> i32 {
        var.lower_bound(&self.csp.assignments)
    }

    pub fn upper_bound<Var: IntegerVariable>(&self, var: &Var) -> i32 {
        var.upper_bound(&self.csp.assignments)
    }
}

// Constraints.
impl Solver {
    /// Wraps a constraint for posting: `solver.add_constraint(...).post()`.
    pub fn add_constraint<ConstraintImpl>(
        &mut self,
        constraint: ConstraintImpl,
    ) -> ConstraintPoster<'_, ConstraintImpl> {
        ConstraintPoster::new(self, constraint)
    }

    pub(crate) fn add_propagator(
        &mut self,
        propagator: impl Propagator + 'static,
    ) -> Result<(), ConstraintOperationError> {
        self.csp.add_propagator(propagator).map(|_| ())
    }

    pub(crate) fn add_boxed_propagator(
        &mut self,
        propagator: Box<dyn Propagator>,
    ) -> Result<(), ConstraintOperationError> {
        self.csp.add_boxed_propagator(propagator).map(|_| ())
    }
}

// Solving.
impl Solver {
    /// A termination condition built from the configured time and conflict limits.
    pub fn termination_from_options(
        &self,
    ) -> Combinator<Option<TimeBudget>, Option<ConflictBudget>> {
        Combinator::new(
            self.options.time_limit.map(TimeBudget::starting_now),
            self.options.conflict_limit.map(ConflictBudget::with_budget),
        )
    }

    /// A randomised arc brancher seeded from the configured seed, for restart
    /// diversification.
    pub fn random_arc_brancher(&self, graph: GraphId) -> RandomArcBrancher {
        RandomArcBrancher::new(graph, self.options.random_seed)
    }

    /// Searches for a single solution.
    pub fn satisfy(
        &mut self,
        brancher: &mut impl Brancher,
        termination: &mut impl TerminationCondition,
    ) -> SatisfactionResult {
        self.csp.restore_state_at_root(brancher);
        match self.csp.solve(termination, brancher) {
            CSPSolverExecutionFlag::Feasible => {
                let solution = self.csp.extract_solution();
                brancher.on_solution(&solution);
                self.csp.restore_state_at_root(brancher);
                SatisfactionResult::Satisfiable(solution)
            }
            CSPSolverExecutionFlag::Infeasible => SatisfactionResult::Unsatisfiable,
            CSPSolverExecutionFlag::Timeout => {
                self.csp.restore_state_at_root(brancher);
                SatisfactionResult::Unknown
            }
        }
    }

    /// Enumerates solutions, reporting each to the callback. Each found solution fails the
    /// current branch so the search moves on to the next one; the configured solution limit
    /// caps the enumeration.
    pub fn enumerate(
        &mut self,
        brancher: &mut impl Brancher,
        termination: &mut impl TerminationCondition,
        mut on_solution: impl FnMut(&Solution),
    ) -> EnumerationResult {
        self.csp.restore_state_at_root(brancher);
        let mut num_solutions = 0;

        loop {
            match self.csp.solve(termination, brancher) {
                CSPSolverExecutionFlag::Feasible => {
                    let solution = self.csp.extract_solution();
                    num_solutions += 1;
                    brancher.on_solution(&solution);
                    on_solution(&solution);

                    if self
                        .options
                        .solution_limit
                        .is_some_and(|limit| num_solutions >= limit)
                    {
                        self.csp.restore_state_at_root(brancher);
                        return EnumerationResult::LimitReached { num_solutions };
                    }
                    if !self.csp.resume_after_solution(brancher) {
                        return EnumerationResult::Exhausted { num_solutions };
                    }
                }
                CSPSolverExecutionFlag::Infeasible => {
                    return EnumerationResult::Exhausted { num_solutions };
                }
                CSPSolverExecutionFlag::Timeout => {
                    self.csp.restore_state_at_root(brancher);
                    return EnumerationResult::Interrupted { num_solutions };
                }
            }
        }
    }

    /// Branch-and-bound optimisation of `objective`. After every incumbent the objective cut
    /// is tightened; with `restart_on_solution` the search restarts from the root instead of
    /// resuming in place.
    pub fn optimise(
        &mut self,
        brancher: &mut impl Brancher,
        termination: &mut impl TerminationCondition,
        direction: OptimisationDirection,
        objective: DomainId,
    ) -> OptimisationResult {
        self.csp.restore_state_at_root(brancher);

        let cut: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        if self
            .csp
            .add_propagator(ObjectiveCutPropagator::new(
                objective,
                direction,
                Rc::clone(&cut),
            ))
            .is_err()
        {
            return OptimisationResult::Unsatisfiable;
        }

        let mut best: Option<Solution> = None;
        loop {
            match self.csp.solve(termination, brancher) {
                CSPSolverExecutionFlag::Feasible => {
                    let solution = self.csp.extract_solution();
                    let objective_value = solution.domain_value(objective);
                    debug!("incumbent with objective {objective_value}");
                    brancher.on_solution(&solution);
                    best = Some(solution);

                    cut.set(Some(match direction {
                        OptimisationDirection::Minimise => objective_value - 1,
                        OptimisationDirection::Maximise => objective_value + 1,
                    }));

                    if self.options.restart_on_solution {
                        self.csp.restore_state_at_root(brancher);
                    } else if !self.csp.resume_after_solution(brancher) {
                        return OptimisationResult::Optimal(best.unwrap());
                    }
                    // The tightened cut (and any propagator gated on a first solution) must
                    // run before the next decision.
                    self.csp.schedule_all_propagators();
                }
                CSPSolverExecutionFlag::Infeasible => {
                    return match best {
                        Some(solution) => OptimisationResult::Optimal(solution),
                        None => OptimisationResult::Unsatisfiable,
                    };
                }
                CSPSolverExecutionFlag::Timeout => {
                    self.csp.restore_state_at_root(brancher);
                    return match best {
                        Some(solution) => OptimisationResult::Satisfiable(solution),
                        None => OptimisationResult::Unknown,
                    };
                }
            }
        }
    }
}
