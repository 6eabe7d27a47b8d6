use marrow_solver::Solver;
use marrow_solver::branching::branchers::FirstEnvelopeArcBrancher;
use marrow_solver::constraints;
use marrow_solver::options::OptimisationDirection;
use marrow_solver::options::SolverOptions;
use marrow_solver::results::OptimisationResult;
use marrow_solver::termination::Indefinite;
use marrow_solver::variables::edge_sets::complete_arcs;

fn distance_weights(num_nodes: usize) -> Vec<Vec<i64>> {
    let mut weights = vec![vec![0i64; num_nodes]; num_nodes];
    for i in 0..num_nodes {
        for j in 0..num_nodes {
            weights[i][j] = (i as i64 - j as i64).abs();
        }
    }
    weights
}

#[test]
fn the_cheapest_path_visits_the_nodes_in_order() {
    let mut solver = Solver::default();
    let graph = solver.new_directed_graph(5, &complete_arcs(5, false));
    let cost = solver.new_bounded_integer(0, 100).unwrap();
    solver
        .add_constraint(constraints::atsp(graph, cost, distance_weights(5), 0, 4))
        .post()
        .expect("the complete digraph has Hamiltonian paths");

    let mut brancher = FirstEnvelopeArcBrancher::new(graph);
    let mut termination = Indefinite;
    let result = solver.optimise(
        &mut brancher,
        &mut termination,
        OptimisationDirection::Minimise,
        cost,
    );

    match result {
        OptimisationResult::Optimal(solution) => {
            assert_eq!(solution.integer_value(&cost), 4);
            let mut arcs = solution.graph_arcs(graph).to_vec();
            arcs.sort_unstable();
            assert_eq!(arcs, vec![(0, 1), (1, 2), (2, 3), (3, 4)]);
        }
        other => panic!("expected the unique optimal path, got {other:?}"),
    }
}

#[test]
fn the_redundant_alldifferent_does_not_change_the_optimum() {
    let mut solver = Solver::with_options(SolverOptions {
        alldiff_ac: true,
        ..SolverOptions::default()
    });
    let graph = solver.new_directed_graph(5, &complete_arcs(5, false));
    let cost = solver.new_bounded_integer(0, 100).unwrap();
    solver
        .add_constraint(constraints::atsp(graph, cost, distance_weights(5), 0, 4))
        .post()
        .expect("the complete digraph has Hamiltonian paths");
    solver
        .add_constraint(constraints::successors_all_different(graph))
        .post()
        .expect("redundant filtering is consistent");

    let mut brancher = FirstEnvelopeArcBrancher::new(graph);
    let mut termination = Indefinite;
    let result = solver.optimise(
        &mut brancher,
        &mut termination,
        OptimisationDirection::Minimise,
        cost,
    );

    match result {
        OptimisationResult::Optimal(solution) => {
            assert_eq!(solution.integer_value(&cost), 4);
        }
        other => panic!("expected an optimal path, got {other:?}"),
    }
}
