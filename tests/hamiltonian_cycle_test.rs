use marrow_solver::Solver;
use marrow_solver::branching::branchers::FirstEnvelopeArcBrancher;
use marrow_solver::constraints;
use marrow_solver::options::HeldKarpMode;
use marrow_solver::options::OptimisationDirection;
use marrow_solver::options::SolverOptions;
use marrow_solver::results::EnumerationResult;
use marrow_solver::results::OptimisationResult;
use marrow_solver::termination::Indefinite;
use marrow_solver::variables::edge_sets::complete_edges;

#[test]
fn the_complete_graph_on_four_nodes_has_exactly_three_hamiltonian_cycles() {
    let mut solver = Solver::default();
    let graph = solver.new_undirected_graph(4, &complete_edges(4));
    solver
        .add_constraint(constraints::hamiltonian_cycle(graph))
        .post()
        .expect("K4 has Hamiltonian cycles");

    let mut brancher = FirstEnvelopeArcBrancher::new(graph);
    let mut termination = Indefinite;
    let mut cycles = Vec::new();
    let result = solver.enumerate(&mut brancher, &mut termination, |solution| {
        let mut arcs = solution.graph_arcs(graph).to_vec();
        arcs.sort_unstable();
        cycles.push(arcs);
    });

    assert_eq!(result, EnumerationResult::Exhausted { num_solutions: 3 });

    // Every solution is a distinct 4-cycle.
    cycles.sort();
    cycles.dedup();
    assert_eq!(cycles.len(), 3);
    for cycle in &cycles {
        assert_eq!(cycle.len(), 4);
    }
}

#[test]
fn the_solution_limit_caps_the_enumeration() {
    let mut solver = Solver::with_options(SolverOptions {
        solution_limit: Some(2),
        ..SolverOptions::default()
    });
    let graph = solver.new_undirected_graph(4, &complete_edges(4));
    solver
        .add_constraint(constraints::hamiltonian_cycle(graph))
        .post()
        .expect("K4 has Hamiltonian cycles");

    let mut brancher = FirstEnvelopeArcBrancher::new(graph);
    let mut termination = Indefinite;
    let result = solver.enumerate(&mut brancher, &mut termination, |_| {});

    assert_eq!(result, EnumerationResult::LimitReached { num_solutions: 2 });
}

#[test]
fn uniform_weights_give_a_tour_of_length_four() {
    let mut solver = Solver::default();
    let graph = solver.new_undirected_graph(4, &complete_edges(4));
    let cost = solver.new_bounded_integer(0, 100).unwrap();
    solver
        .add_constraint(constraints::tsp(
            graph,
            cost,
            vec![vec![1; 4]; 4],
            HeldKarpMode::Disabled,
        ))
        .post()
        .expect("K4 has tours");

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
            assert_eq!(solution.graph_arcs(graph).len(), 4);
        }
        other => panic!("expected an optimal tour, got {other:?}"),
    }
}

#[test]
fn an_edgeless_graph_has_no_hamiltonian_cycle() {
    let mut solver = Solver::default();
    let graph = solver.new_undirected_graph(4, &[(0, 1), (1, 2)]);

    let result = solver
        .add_constraint(constraints::hamiltonian_cycle(graph))
        .post();
    assert!(result.is_err());
}
