use marrow_solver::Solver;
use marrow_solver::branching::branchers::CompositeBrancher;
use marrow_solver::branching::branchers::FirstEnvelopeArcBrancher;
use marrow_solver::branching::branchers::InputOrderIntBrancher;
use marrow_solver::constraints;
use marrow_solver::results::SatisfactionResult;
use marrow_solver::termination::Indefinite;

const TRIANGLES: [(u32, u32); 6] = [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)];

#[test]
fn two_mandatory_triangles_instantiate_k_to_two() {
    let mut solver = Solver::default();
    let graph = solver.new_undirected_graph(6, &TRIANGLES);
    let k = solver.new_bounded_integer(0, 6).unwrap();
    solver
        .add_constraint(constraints::n_cliques(graph, k))
        .post()
        .expect("two triangles are partitionable");

    for (i, j) in TRIANGLES {
        solver.enforce_arc(graph, i, j).expect("edge is possible");
    }

    assert_eq!(solver.lower_bound(&k), 2);
    assert_eq!(solver.upper_bound(&k), 2);
}

#[test]
fn a_partition_is_found_when_k_is_free() {
    let mut solver = Solver::default();
    let graph = solver.new_undirected_graph(6, &TRIANGLES);
    let k = solver.new_bounded_integer(0, 6).unwrap();
    solver
        .add_constraint(constraints::n_cliques(graph, k))
        .post()
        .expect("two triangles are partitionable");

    let mut brancher = CompositeBrancher::new(vec![
        Box::new(FirstEnvelopeArcBrancher::new(graph)),
        Box::new(InputOrderIntBrancher::new(vec![k])),
    ]);
    let mut termination = Indefinite;
    match solver.satisfy(&mut brancher, &mut termination) {
        SatisfactionResult::Satisfiable(solution) => {
            let k_value = solution.integer_value(&k);
            assert!((2..=6).contains(&k_value));
        }
        other => panic!("expected a partition, got {other:?}"),
    }
}

#[test]
fn demanding_one_clique_across_disconnected_triangles_fails() {
    let mut solver = Solver::default();
    let graph = solver.new_undirected_graph(6, &TRIANGLES);
    let k = solver.new_bounded_integer(1, 1).unwrap();

    // The envelope splits the mandatory nodes into two components, so a single clique is
    // already impossible at the root.
    let result = solver.add_constraint(constraints::n_cliques(graph, k)).post();
    assert!(result.is_err());
}
