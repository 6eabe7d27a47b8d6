use log::debug;
use log::trace;

use crate::basic_types::CSPSolverExecutionFlag;
use crate::basic_types::Cause;
use crate::basic_types::Conflict;
use crate::basic_types::ConstraintOperationError;
use crate::basic_types::GraphSolution;
use crate::basic_types::PropagationStatusCP;
use crate::basic_types::Solution;
use crate::basic_types::VariableRef;
use crate::branching::Brancher;
use crate::branching::Decision;
use crate::branching::SelectionContext;
use crate::containers::KeyedVec;
use crate::engine::cp::Assignments;
use crate::engine::cp::GraphAssignments;
use crate::engine::cp::PropagatorQueue;
use crate::engine::cp::TrailedInt;
use crate::engine::cp::TrailedValues;
use crate::engine::cp::WatchListCp;
use crate::engine::explanation::ExplanationSink;
use crate::engine::explanation::NoopExplanations;
use crate::engine::explanation::RecordedChange;
use crate::engine::explanation::RecordedUpdate;
use crate::engine::propagation::EnqueueDecision;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::PropagationContextWithTrailedValues;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorId;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::PropagatorStore;
use crate::marrow_assert_moderate;
use crate::marrow_assert_simple;
use crate::statistics::SolverStatistics;
use crate::termination::TerminationCondition;
use crate::variables::DomainId;
use crate::variables::GraphId;

/// The solver kernel: owns the domain stores, the trail substrate, the watch lists, the
/// propagation queue and the posted propagators, and runs the propagation fixed point and
/// the backtracking search over them.
///
/// The search is a chronological DFS. Conceptually it moves through the states READY (at a
/// fixed point, about to take a decision), DOWN (a decision was applied, propagating), UP
/// (a conflict occurred, unwinding to the deepest decision with an untried branch) and
/// STOPPED (conclusion reached or a termination condition tripped). Each decision opens a
/// new decision level across all trailed state; each backtrack closes levels and restores
/// every reversible cell to its pre-decision value.
#[derive(Debug)]
pub(crate) struct ConstraintSatisfactionSolver {
    pub(crate) assignments: Assignments,
    pub(crate) graphs: GraphAssignments,
    pub(crate) trailed_values: TrailedValues,
    watch_list: WatchListCp,
    propagator_queue: PropagatorQueue,
    pub(crate) propagators: PropagatorStore,
    /// Reversible 0/1 flag per propagator; 0 means passive (entailed) until backtracking.
    active_flags: KeyedVec<PropagatorId, TrailedInt>,
    pub(crate) explanations: Box<dyn ExplanationSink>,
    decision_stack: Vec<DecisionFrame>,
    /// A conflict produced by a decision application, consumed by the next search iteration.
    pending_conflict: Option<Conflict>,
    state: CSPSolverState,
    pub(crate) statistics: SolverStatistics,
}

#[derive(Clone, Copy, Debug)]
struct DecisionFrame {
    decision: Decision,
    /// Whether this frame already is the second (negated) branch.
    is_second_branch: bool,
}

/// The externally observable state of the solver kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CSPSolverState {
    Ready,
    Solving,
    ContainsSolution,
    Infeasible,
    Timeout,
}

impl Default for ConstraintSatisfactionSolver {
    fn default() -> Self {
        ConstraintSatisfactionSolver {
            assignments: Assignments::default(),
            graphs: GraphAssignments::default(),
            trailed_values: TrailedValues::default(),
            watch_list: WatchListCp::default(),
            propagator_queue: PropagatorQueue::default(),
            propagators: PropagatorStore::default(),
            active_flags: KeyedVec::default(),
            explanations: Box::new(NoopExplanations),
            decision_stack: Vec::new(),
            pending_conflict: None,
            state: CSPSolverState::Ready,
            statistics: SolverStatistics::default(),
        }
    }
}

// Variable and propagator management.
impl ConstraintSatisfactionSolver {
    pub(crate) fn with_explanation_sink(sink: Box<dyn ExplanationSink>) -> Self {
        ConstraintSatisfactionSolver {
            explanations: sink,
            ..Default::default()
        }
    }

    pub(crate) fn create_new_integer_variable(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        self.watch_list.grow_integer();
        self.assignments.grow(lower_bound, upper_bound)
    }

    pub(crate) fn create_new_integer_variable_sparse(&mut self, values: Vec<i32>) -> DomainId {
        self.watch_list.grow_integer();
        self.assignments.grow_sparse(values)
    }

    pub(crate) fn create_new_graph_variable(
        &mut self,
        num_nodes: usize,
        directed: bool,
        arcs: &[(u32, u32)],
    ) -> GraphId {
        self.watch_list.grow_graph();
        self.graphs.grow(num_nodes, directed, arcs, true)
    }

    pub(crate) fn get_decision_level(&self) -> usize {
        self.assignments.get_decision_level()
    }

    /// Applies a root-level reduction while building the model (e.g. fixing an edge of an
    /// instance) and propagates it. A conflict makes the solver permanently infeasible, the
    /// same as posting an infeasible propagator.
    pub(crate) fn root_level_enforce_arc(
        &mut self,
        graph: GraphId,
        from: u32,
        to: u32,
    ) -> Result<(), ConstraintOperationError> {
        self.root_level_reduction(|solver| solver.graphs.enforce_arc(graph, from, to, Cause::Search))
    }

    pub(crate) fn root_level_remove_arc(
        &mut self,
        graph: GraphId,
        from: u32,
        to: u32,
    ) -> Result<(), ConstraintOperationError> {
        self.root_level_reduction(|solver| solver.graphs.remove_arc(graph, from, to, Cause::Search))
    }

    fn root_level_reduction(
        &mut self,
        reduction: impl FnOnce(&mut Self) -> PropagationStatusCP,
    ) -> Result<(), ConstraintOperationError> {
        if self.state == CSPSolverState::Infeasible {
            return Err(ConstraintOperationError::InfeasibleState);
        }
        if self.get_decision_level() > 0 {
            return Err(ConstraintOperationError::NotAtRoot);
        }
        let status = reduction(self).and_then(|_| self.propagate_to_fixed_point());
        match status {
            Ok(()) => Ok(()),
            Err(_) => {
                self.prepare_for_conflict();
                self.state = CSPSolverState::Infeasible;
                Err(ConstraintOperationError::InfeasiblePropagator)
            }
        }
    }

    /// Posts a propagator: allocates it, lets it register its subscriptions, and runs an
    /// initial propagation to the fixed point. A root-level conflict makes the solver
    /// permanently infeasible.
    pub(crate) fn add_propagator(
        &mut self,
        propagator: impl Propagator + 'static,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        self.add_boxed_propagator(Box::new(propagator))
    }

    pub(crate) fn add_boxed_propagator(
        &mut self,
        propagator: Box<dyn Propagator>,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        if self.state == CSPSolverState::Infeasible {
            return Err(ConstraintOperationError::InfeasibleState);
        }
        if self.get_decision_level() > 0 {
            return Err(ConstraintOperationError::NotAtRoot);
        }

        let propagator_id = self.propagators.alloc(propagator);
        let active_flag = self.trailed_values.grow(1);
        let pushed = self.active_flags.push(active_flag);
        marrow_assert_simple!(pushed == propagator_id);

        let mut context = PropagatorInitialisationContext::new(
            &mut self.watch_list,
            &mut self.trailed_values,
            propagator_id,
            &self.assignments,
            &self.graphs,
        );
        let initialisation = self.propagators[propagator_id].initialise_at_root(&mut context);

        let status = initialisation.and_then(|_| {
            self.propagator_queue
                .enqueue_propagator(propagator_id, self.propagators[propagator_id].priority());
            self.propagate_to_fixed_point()
        });

        match status {
            Ok(()) => Ok(propagator_id),
            Err(conflict) => {
                trace!(
                    "posting {} failed at the root: {:?}",
                    self.propagators[propagator_id].name(),
                    conflict
                );
                self.state = CSPSolverState::Infeasible;
                Err(ConstraintOperationError::InfeasiblePropagator)
            }
        }
    }

    /// Schedules a single propagator regardless of events, the `force_propagate` entry point.
    pub(crate) fn schedule_propagator(&mut self, propagator_id: PropagatorId) {
        if self.trailed_values.read(self.active_flags[propagator_id]) != 0 {
            self.propagator_queue
                .enqueue_propagator(propagator_id, self.propagators[propagator_id].priority());
        }
    }

    /// Schedules every active propagator; used after an externally visible change such as a
    /// tightened objective cut.
    pub(crate) fn schedule_all_propagators(&mut self) {
        for propagator_id in self.propagators.ids().collect::<Vec<_>>() {
            self.schedule_propagator(propagator_id);
        }
    }
}

// Propagation.
impl ConstraintSatisfactionSolver {
    /// Runs propagators until the queue and the event buffers are empty (a fixed point), or a
    /// conflict is raised. On conflict the queue and stale events are cleared; the caller is
    /// expected to backtrack.
    pub(crate) fn propagate_to_fixed_point(&mut self) -> PropagationStatusCP {
        loop {
            self.notify_propagators_about_domain_events();

            let Some(propagator_id) = self.propagator_queue.pop() else {
                return Ok(());
            };
            if self.trailed_values.read(self.active_flags[propagator_id]) == 0 {
                continue;
            }

            self.statistics.num_propagations += 1;
            let solution_count = self.statistics.num_solutions;

            let context = PropagationContextMut::new(
                &mut self.trailed_values,
                &mut self.assignments,
                &mut self.graphs,
                propagator_id,
                self.active_flags[propagator_id],
                solution_count,
            );
            if let Err(conflict) = self.propagators[propagator_id].propagate(context) {
                trace!(
                    "conflict in {}: {:?}",
                    self.propagators[propagator_id].name(),
                    conflict
                );
                self.prepare_for_conflict();
                return Err(conflict);
            }
        }
    }

    /// Drains the event buffers of both stores, records each change with the explanation
    /// sink, and notifies subscribed propagators. The propagator that caused a change is not
    /// re-notified of it.
    fn notify_propagators_about_domain_events(&mut self) {
        let solution_count = self.statistics.num_solutions;

        let int_events = self.assignments.drain_events();
        for (domain, events, cause) in int_events {
            self.explanations.record(RecordedChange {
                variable: VariableRef::Integer(domain),
                update: RecordedUpdate::Integer {
                    events,
                    lower_bound: self.assignments.get_lower_bound(domain),
                    upper_bound: self.assignments.get_upper_bound(domain),
                },
                cause,
            });

            for index in 0..self.watch_list.int_watchers(domain).len() {
                let watcher = self.watch_list.int_watchers(domain)[index];
                let relevant = watcher.events & events;
                if relevant.is_empty() {
                    continue;
                }
                if let Cause::Propagator(originator) = cause {
                    if originator == watcher.id.propagator {
                        continue;
                    }
                }
                if self.trailed_values.read(self.active_flags[watcher.id.propagator]) == 0 {
                    continue;
                }

                let context = PropagationContextWithTrailedValues::new(
                    &mut self.trailed_values,
                    &self.assignments,
                    &self.graphs,
                    solution_count,
                );
                let decision = self.propagators[watcher.id.propagator].notify(
                    context,
                    watcher.id.variable,
                    relevant,
                );
                if decision == EnqueueDecision::Enqueue {
                    self.propagator_queue.enqueue_propagator(
                        watcher.id.propagator,
                        self.propagators[watcher.id.propagator].priority(),
                    );
                }
            }
        }

        let graph_events = self.graphs.drain_events();
        for (graph, update, cause) in graph_events {
            self.explanations.record(RecordedChange {
                variable: VariableRef::Graph(graph),
                update: RecordedUpdate::Graph(update),
                cause,
            });

            for index in 0..self.watch_list.graph_watchers(graph).len() {
                let watcher = self.watch_list.graph_watchers(graph)[index];
                if !watcher.events.contains(update.kind()) {
                    continue;
                }
                if let Cause::Propagator(originator) = cause {
                    if originator == watcher.id.propagator {
                        continue;
                    }
                }
                if self.trailed_values.read(self.active_flags[watcher.id.propagator]) == 0 {
                    continue;
                }

                let context = PropagationContextWithTrailedValues::new(
                    &mut self.trailed_values,
                    &self.assignments,
                    &self.graphs,
                    solution_count,
                );
                let decision = self.propagators[watcher.id.propagator].notify_graph(
                    context,
                    watcher.id.variable,
                    update,
                );
                if decision == EnqueueDecision::Enqueue {
                    self.propagator_queue.enqueue_propagator(
                        watcher.id.propagator,
                        self.propagators[watcher.id.propagator].priority(),
                    );
                }
            }
        }
    }

    /// Clears scheduling state that refers to changes about to be undone.
    fn prepare_for_conflict(&mut self) {
        self.assignments.discard_events();
        self.graphs.discard_events();
        self.propagator_queue.clear();
    }
}

// Search.
impl ConstraintSatisfactionSolver {
    /// Runs the search until a solution is found, infeasibility is proven for the remaining
    /// search space, or a termination condition trips. On [`CSPSolverExecutionFlag::Feasible`]
    /// the solver is left *at* the solution so the caller can extract it and decide whether
    /// to resume.
    pub(crate) fn solve(
        &mut self,
        termination: &mut impl TerminationCondition,
        brancher: &mut impl Brancher,
    ) -> CSPSolverExecutionFlag {
        if self.state == CSPSolverState::Infeasible {
            return CSPSolverExecutionFlag::Infeasible;
        }
        self.state = CSPSolverState::Solving;

        loop {
            if termination.should_stop() {
                self.state = CSPSolverState::Timeout;
                return CSPSolverExecutionFlag::Timeout;
            }

            let status = match self.pending_conflict.take() {
                Some(conflict) => Err(conflict),
                None => self.propagate_to_fixed_point(),
            };

            match status {
                Ok(()) => {
                    let decision = {
                        let mut context = SelectionContext::new(&self.assignments, &self.graphs);
                        brancher.next_decision(&mut context)
                    };
                    match decision {
                        None => {
                            self.statistics.num_solutions += 1;
                            self.state = CSPSolverState::ContainsSolution;
                            debug!(
                                "solution found at depth {}",
                                self.decision_stack.len()
                            );
                            return CSPSolverExecutionFlag::Feasible;
                        }
                        Some(decision) => {
                            trace!("decision: {:?}", decision);
                            self.statistics.num_decisions += 1;
                            termination.decision_has_been_made();
                            self.declare_new_decision_level();
                            self.decision_stack.push(DecisionFrame {
                                decision,
                                is_second_branch: false,
                            });
                            self.statistics.peak_depth =
                                self.statistics.peak_depth.max(self.decision_stack.len());
                            if let Err(conflict) = self.apply_decision(decision) {
                                self.prepare_for_conflict();
                                self.pending_conflict = Some(conflict);
                            }
                        }
                    }
                }
                Err(_conflict) => {
                    self.statistics.num_conflicts += 1;
                    termination.conflict_has_been_found();
                    brancher.on_conflict();
                    if !self.unwind_to_next_branch(brancher) {
                        self.state = CSPSolverState::Infeasible;
                        return CSPSolverExecutionFlag::Infeasible;
                    }
                }
            }
        }
    }

    /// Treats the current solution (or conflict) as exhausted and moves to the next untried
    /// branch. Returns `false` when the whole tree is exhausted.
    pub(crate) fn resume_after_solution(&mut self, brancher: &mut impl Brancher) -> bool {
        let resumed = self.unwind_to_next_branch(brancher);
        if !resumed {
            self.state = CSPSolverState::Infeasible;
        }
        resumed
    }

    /// Pops decisions until one with an untried second branch is found, then applies its
    /// negation at a fresh decision level. An immediately failing negation is stored as a
    /// pending conflict for the caller's next iteration.
    fn unwind_to_next_branch(&mut self, brancher: &mut impl Brancher) -> bool {
        loop {
            let Some(frame) = self.decision_stack.pop() else {
                // The root: nothing left to try.
                return false;
            };
            self.backtrack(self.decision_stack.len());
            brancher.on_backtrack();

            if frame.is_second_branch {
                continue;
            }

            let negation = frame.decision.negation();
            trace!("second branch: {:?}", negation);
            self.declare_new_decision_level();
            self.decision_stack.push(DecisionFrame {
                decision: negation,
                is_second_branch: true,
            });
            if let Err(conflict) = self.apply_decision(negation) {
                self.prepare_for_conflict();
                self.pending_conflict = Some(conflict);
            }
            return true;
        }
    }

    fn apply_decision(&mut self, decision: Decision) -> PropagationStatusCP {
        match decision {
            Decision::Assign(domain, value) => {
                self.assignments.make_assignment(domain, value, Cause::Search)
            }
            Decision::RemoveValue(domain, value) => {
                self.assignments.remove_value(domain, value, Cause::Search)
            }
            Decision::SplitLessOrEqual(domain, value) => {
                self.assignments
                    .tighten_upper_bound(domain, value, Cause::Search)
            }
            Decision::SplitGreaterOrEqual(domain, value) => {
                self.assignments
                    .tighten_lower_bound(domain, value, Cause::Search)
            }
            Decision::EnforceArc(graph, from, to) => {
                self.graphs.enforce_arc(graph, from, to, Cause::Search)
            }
            Decision::RemoveArc(graph, from, to) => {
                self.graphs.remove_arc(graph, from, to, Cause::Search)
            }
        }
    }

    pub(crate) fn declare_new_decision_level(&mut self) {
        self.assignments.increase_decision_level();
        self.graphs.increase_decision_level();
        self.trailed_values.increase_decision_level();
        self.explanations.on_new_decision_level();
    }

    /// Pops the trail back to the given decision level, restoring every reversible cell, and
    /// lets the propagators discard buffered deltas.
    pub(crate) fn backtrack(&mut self, backtrack_level: usize) {
        marrow_assert_simple!(backtrack_level < self.get_decision_level());

        self.assignments.synchronise(backtrack_level);
        self.graphs.synchronise(backtrack_level);
        self.trailed_values.synchronise(backtrack_level);
        self.assignments.discard_events();
        self.graphs.discard_events();
        self.propagator_queue.clear();
        self.explanations.on_backtrack(backtrack_level);

        let solution_count = self.statistics.num_solutions;
        let context =
            PropagationContext::new(&self.assignments, &self.graphs, solution_count);
        for propagator in self.propagators.iter_mut() {
            propagator.synchronise(context);
        }
    }

    /// Pops everything and forgets the decision stack; the root state is fully restored.
    pub(crate) fn restore_state_at_root(&mut self, brancher: &mut impl Brancher) {
        if self.get_decision_level() > 0 {
            self.backtrack(0);
            self.decision_stack.clear();
            self.statistics.num_restarts += 1;
            brancher.on_restart();
        }
        self.pending_conflict = None;
        if self.state != CSPSolverState::Infeasible {
            self.state = CSPSolverState::Ready;
        }
    }
}

// Solution extraction.
impl ConstraintSatisfactionSolver {
    /// Snapshots the current assignment. Every integer variable must be assigned and every
    /// graph variable instantiated; the branchers guarantee this when they return no further
    /// decision.
    pub(crate) fn extract_solution(&self) -> Solution {
        marrow_assert_moderate!(
            self.assignments
                .domain_ids()
                .all(|domain| self.assignments.is_assigned(domain)),
            "a solution requires every integer variable to be assigned"
        );

        let integer_values = self
            .assignments
            .domain_ids()
            .map(|domain| self.assignments.get_lower_bound(domain))
            .collect();

        let graphs = (0..self.graphs.num_graphs())
            .map(|index| {
                let graph = GraphId { id: index as u32 };
                let num_nodes = self.graphs.num_nodes(graph);
                let directed = self.graphs.is_directed(graph);
                let nodes = (0..num_nodes as u32)
                    .filter(|&node| self.graphs.is_node_in_kernel(graph, node))
                    .collect();
                let mut arcs = Vec::new();
                for from in 0..num_nodes as u32 {
                    for to in self.graphs.kernel_successors(graph, from) {
                        if directed || from <= to {
                            arcs.push((from, to));
                        }
                    }
                }
                GraphSolution {
                    num_nodes,
                    directed,
                    nodes,
                    arcs,
                }
            })
            .collect();

        Solution::new(integer_values, graphs)
    }
}
