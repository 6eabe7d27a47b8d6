use marrow_solver::Solver;
use marrow_solver::branching::branchers::CompositeBrancher;
use marrow_solver::branching::branchers::FirstEnvelopeArcBrancher;
use marrow_solver::branching::branchers::InputOrderIntBrancher;
use marrow_solver::constraints;
use marrow_solver::results::SatisfactionResult;
use marrow_solver::termination::Indefinite;
use marrow_solver::variables::edge_sets::complete_arcs;

#[test]
fn a_two_tree_partition_has_exactly_two_roots() {
    let mut solver = Solver::default();
    let graph = solver.new_directed_graph(4, &complete_arcs(4, true));
    let k = solver.new_bounded_integer(2, 2).unwrap();
    solver
        .add_constraint(constraints::n_trees(graph, k))
        .post()
        .expect("two anti-arborescences over four nodes exist");

    let mut brancher = CompositeBrancher::new(vec![
        Box::new(FirstEnvelopeArcBrancher::new(graph)),
        Box::new(InputOrderIntBrancher::new(vec![k])),
    ]);
    let mut termination = Indefinite;
    match solver.satisfy(&mut brancher, &mut termination) {
        SatisfactionResult::Satisfiable(solution) => {
            let arcs = solution.graph_arcs(graph);
            // Exactly one outgoing arc per node, exactly two of them self-loops.
            assert_eq!(arcs.len(), 4);
            let roots = arcs.iter().filter(|(from, to)| from == to).count();
            assert_eq!(roots, 2);
        }
        other => panic!("expected a tree partition, got {other:?}"),
    }
}

#[test]
fn a_third_forced_self_loop_fails_when_k_is_two() {
    let mut solver = Solver::default();
    let graph = solver.new_directed_graph(4, &complete_arcs(4, true));
    let k = solver.new_bounded_integer(2, 2).unwrap();
    solver
        .add_constraint(constraints::n_trees(graph, k))
        .post()
        .expect("consistent at the root");

    solver.enforce_arc(graph, 0, 0).expect("first root");
    solver.enforce_arc(graph, 1, 1).expect("second root");

    // Reaching the budget already removed the other self-loops.
    let result = solver.enforce_arc(graph, 2, 2);
    assert!(result.is_err());
}

#[test]
fn nodes_that_can_only_be_roots_bound_k_from_below() {
    let mut solver = Solver::default();
    // Nodes 0, 1 and 2 have only their self-loop as a possible outgoing arc.
    let arcs = [(0, 0), (1, 1), (2, 2), (3, 0), (3, 3)];
    let graph = solver.new_directed_graph(4, &arcs);
    let k = solver.new_bounded_integer(2, 2).unwrap();

    // Out-degree one forces three self-loops, one more root than k allows.
    let result = solver.add_constraint(constraints::n_trees(graph, k)).post();
    assert!(result.is_err());
}

#[test]
fn a_single_tree_points_every_node_at_the_root() {
    let mut solver = Solver::default();
    // A chain 2 -> 1 -> 0 with the root loop at node 0.
    let arcs = [(0, 0), (1, 0), (2, 1)];
    let graph = solver.new_directed_graph(3, &arcs);
    let k = solver.new_bounded_integer(1, 1).unwrap();
    solver
        .add_constraint(constraints::n_trees(graph, k))
        .post()
        .expect("the chain is a valid anti-arborescence");

    let mut brancher = FirstEnvelopeArcBrancher::new(graph);
    let mut termination = Indefinite;
    match solver.satisfy(&mut brancher, &mut termination) {
        SatisfactionResult::Satisfiable(solution) => {
            let mut arcs = solution.graph_arcs(graph).to_vec();
            arcs.sort_unstable();
            assert_eq!(arcs, vec![(0, 0), (1, 0), (2, 1)]);
        }
        other => panic!("expected the unique tree, got {other:?}"),
    }
}
