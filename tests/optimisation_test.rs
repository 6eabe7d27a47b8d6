use marrow_solver::Solver;
use marrow_solver::branching::branchers::InputOrderIntBrancher;
use marrow_solver::branching::branchers::MinCostArcBrancher;
use marrow_solver::constraints;
use marrow_solver::options::HeldKarpMode;
use marrow_solver::options::OptimisationDirection;
use marrow_solver::options::RoundingMode;
use marrow_solver::options::SolverOptions;
use marrow_solver::results::OptimisationResult;
use marrow_solver::termination::ConflictBudget;
use marrow_solver::termination::Indefinite;
use marrow_solver::variables::edge_sets::complete_edges;
use marrow_solver::weights::euclidean_matrix;

/// Cyclic distances `min(|i - j|, n - |i - j|)`; the optimal tour costs exactly `n`.
fn ring_weights(num_nodes: usize) -> Vec<Vec<i64>> {
    let mut weights = vec![vec![0i64; num_nodes]; num_nodes];
    for i in 0..num_nodes {
        for j in 0..num_nodes {
            let direct = (i as i64 - j as i64).abs();
            weights[i][j] = direct.min(num_nodes as i64 - direct);
        }
    }
    weights
}

fn solve_ring_tsp(num_nodes: usize, options: SolverOptions, hk_mode: HeldKarpMode) -> i32 {
    let mut solver = Solver::with_options(options);
    let weights = ring_weights(num_nodes);
    let graph = solver.new_undirected_graph(num_nodes, &complete_edges(num_nodes as u32));
    let cost = solver.new_bounded_integer(0, 10_000).unwrap();
    solver
        .add_constraint(constraints::tsp(graph, cost, weights.clone(), hk_mode))
        .post()
        .expect("complete graphs have tours");

    let mut brancher = MinCostArcBrancher::new(graph, weights);
    let mut termination = Indefinite;
    match solver.optimise(
        &mut brancher,
        &mut termination,
        OptimisationDirection::Minimise,
        cost,
    ) {
        OptimisationResult::Optimal(solution) => solution.integer_value(&cost),
        other => panic!("expected an optimum, got {other:?}"),
    }
}

#[test]
fn the_ring_optimum_is_found_without_the_relaxation() {
    assert_eq!(
        solve_ring_tsp(8, SolverOptions::default(), HeldKarpMode::Disabled),
        8
    );
}

#[test]
fn the_ring_optimum_is_found_with_the_relaxation_from_the_root() {
    assert_eq!(
        solve_ring_tsp(8, SolverOptions::default(), HeldKarpMode::FromRoot),
        8
    );
}

#[test]
fn the_ring_optimum_is_found_with_the_relaxation_after_the_first_solution() {
    assert_eq!(
        solve_ring_tsp(
            8,
            SolverOptions::default(),
            HeldKarpMode::AfterFirstSolution
        ),
        8
    );
}

#[test]
fn restarting_on_each_incumbent_reaches_the_same_optimum() {
    let options = SolverOptions {
        restart_on_solution: true,
        ..SolverOptions::default()
    };
    assert_eq!(solve_ring_tsp(7, options, HeldKarpMode::FromRoot), 7);
}

#[test]
fn maximisation_climbs_to_the_upper_end_of_the_domain() {
    let mut solver = Solver::default();
    let x = solver.new_bounded_integer(0, 9).unwrap();

    let mut brancher = InputOrderIntBrancher::new(vec![x]);
    let mut termination = Indefinite;
    match solver.optimise(
        &mut brancher,
        &mut termination,
        OptimisationDirection::Maximise,
        x,
    ) {
        OptimisationResult::Optimal(solution) => assert_eq!(solution.integer_value(&x), 9),
        other => panic!("expected the maximum, got {other:?}"),
    }
}

#[test]
fn an_exhausted_conflict_budget_reports_unknown() {
    let mut solver = Solver::default();
    let weights = ring_weights(8);
    let graph = solver.new_undirected_graph(8, &complete_edges(8));
    let cost = solver.new_bounded_integer(0, 10_000).unwrap();
    solver
        .add_constraint(constraints::tsp(
            graph,
            cost,
            weights.clone(),
            HeldKarpMode::Disabled,
        ))
        .post()
        .expect("complete graphs have tours");

    let mut brancher = MinCostArcBrancher::new(graph, weights);
    // Stop before the search may even start.
    let mut termination = ConflictBudget::with_budget(0);
    let result = solver.optimise(
        &mut brancher,
        &mut termination,
        OptimisationDirection::Minimise,
        cost,
    );
    assert!(matches!(result, OptimisationResult::Unknown));
}

#[test]
fn euclidean_instances_respect_the_configured_rounding() {
    // Points on a 3-4-5 triangle: all distances integral, rounding mode immaterial.
    let points = [(0.0, 0.0), (3.0, 0.0), (3.0, 4.0)];
    let weights = euclidean_matrix(&points, RoundingMode::Round);
    assert_eq!(weights[0][1], 3);
    assert_eq!(weights[1][2], 4);
    assert_eq!(weights[0][2], 5);

    let mut solver = Solver::default();
    let graph = solver.new_undirected_graph(3, &complete_edges(3));
    let cost = solver.new_bounded_integer(0, 100).unwrap();
    solver
        .add_constraint(constraints::tsp(
            graph,
            cost,
            weights.clone(),
            HeldKarpMode::Disabled,
        ))
        .post()
        .expect("a triangle is a tour");

    let mut brancher = MinCostArcBrancher::new(graph, weights);
    let mut termination = Indefinite;
    match solver.optimise(
        &mut brancher,
        &mut termination,
        OptimisationDirection::Minimise,
        cost,
    ) {
        OptimisationResult::Optimal(solution) => assert_eq!(solution.integer_value(&cost), 12),
        other => panic!("expected the triangle tour, got {other:?}"),
    }
}
