use crate::basic_types::Conflict;
use crate::basic_types::ConflictReason;
use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::domain_events::DomainEvents;
use crate::engine::cp::domain_events::GraphEvents;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::ReadDomains;
use crate::variables::DomainId;
use crate::variables::GraphId;

const EPSILON: f64 = 1e-6;

/// The Held-Karp one-tree relaxation of the symmetric travelling salesman problem.
///
/// A minimum 1-tree is a minimum spanning tree over the nodes `1..n` plus the two cheapest
/// edges at node 0; its weight under Lagrangian node penalties π (edge weights shifted by
/// `π_i + π_j`, the total corrected by `-2Σπ`) is a lower bound on the tour cost for any π.
/// The propagator maximises that bound by subgradient ascent on π with an exponentially
/// decaying step, keeps the best one-tree found, and tightens the cost lower bound with it;
/// a bound exceeding the cost upper bound is a contradiction.
///
/// The best one-tree also drives the marginal-cost filtering: a non-tree edge whose reduced
/// cost (its penalised weight minus the heaviest tree edge on the path between its
/// endpoints) pushes the bound over the budget is removed, and a tree edge whose cheapest
/// replacement pushes the bound over the budget is enforced.
///
/// With `wait_first_solution` the propagator stays dormant until the search has produced an
/// incumbent, which amortises its cost on models where the relaxation only pays off once a
/// budget exists.
#[derive(Clone, Debug)]
pub(crate) struct OneTreeRelaxationPropagator {
    graph: GraphId,
    cost: DomainId,
    weights: Vec<Vec<i64>>,
    iteration_budget: u32,
    wait_first_solution: bool,
    /// Lagrangian node penalties; kept across runs as a warm start. Any value yields a valid
    /// bound, so the state needs no trailing.
    penalties: Vec<f64>,
}

/// A one-tree together with the penalties it was built under.
#[derive(Clone, Debug)]
struct OneTree {
    /// Spanning tree edges over the nodes `1..n`.
    tree_edges: Vec<(u32, u32)>,
    /// The two chosen edges at node 0, cheapest first.
    zero_edges: [(u32, u32); 2],
    bound: f64,
    degrees: Vec<u32>,
    penalties: Vec<f64>,
}

impl OneTreeRelaxationPropagator {
    pub(crate) fn new(
        graph: GraphId,
        cost: DomainId,
        weights: Vec<Vec<i64>>,
        iteration_budget: u32,
        wait_first_solution: bool,
    ) -> Self {
        OneTreeRelaxationPropagator {
            graph,
            cost,
            weights,
            iteration_budget,
            wait_first_solution,
            penalties: Vec::new(),
        }
    }

    fn penalised_weight(&self, penalties: &[f64], i: u32, j: u32) -> f64 {
        self.weights[i as usize][j as usize] as f64
            + penalties[i as usize]
            + penalties[j as usize]
    }

    /// All current envelope edges, smaller endpoint first.
    fn envelope_edges(&self, context: &impl ReadDomains) -> Vec<(u32, u32)> {
        let num_nodes = context.num_nodes(self.graph) as u32;
        let mut edges = Vec::new();
        for i in 0..num_nodes {
            for j in context.envelope_successors(self.graph, i) {
                if i < j {
                    edges.push((i, j));
                }
            }
        }
        edges
    }

    fn build_one_tree(
        &self,
        context: &impl ReadDomains,
        edges: &[(u32, u32)],
    ) -> Result<OneTree, Conflict> {
        let num_nodes = context.num_nodes(self.graph);
        let conflict = || Conflict::graph(self.graph, ConflictReason::Unknown);

        // Mandatory edges are part of every tour, so they are forced into the tree first.
        let mut inner: Vec<(f64, u32, u32, bool)> = edges
            .iter()
            .filter(|&&(i, _)| i >= 1)
            .map(|&(i, j)| {
                let mandatory = context.is_arc_in_kernel(self.graph, i, j);
                (self.penalised_weight(&self.penalties, i, j), i, j, mandatory)
            })
            .collect();
        inner.sort_by(|a, b| {
            b.3.cmp(&a.3)
                .then(a.0.partial_cmp(&b.0).expect("penalties are finite"))
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        let mut parent: Vec<u32> = (0..num_nodes as u32).collect();
        fn find(parent: &mut [u32], mut x: u32) -> u32 {
            while parent[x as usize] != x {
                parent[x as usize] = parent[parent[x as usize] as usize];
                x = parent[x as usize];
            }
            x
        }

        let mut tree_edges = Vec::with_capacity(num_nodes.saturating_sub(2));
        let mut degrees = vec![0u32; num_nodes];
        let mut penalised_total = 0.0;
        for &(weight, i, j, _) in &inner {
            let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
            if ri == rj {
                continue;
            }
            parent[ri as usize] = rj;
            tree_edges.push((i, j));
            degrees[i as usize] += 1;
            degrees[j as usize] += 1;
            penalised_total += weight;
        }
        if tree_edges.len() + 2 != num_nodes {
            // The envelope no longer spans the nodes 1..n.
            return Err(conflict());
        }

        // The two cheapest edges at node 0, mandatory ones first.
        let mut at_zero: Vec<(f64, bool, u32)> = context
            .envelope_successors(self.graph, 0)
            .map(|j| {
                let mandatory = context.is_arc_in_kernel(self.graph, 0, j);
                (self.penalised_weight(&self.penalties, 0, j), !mandatory, j)
            })
            .collect();
        at_zero.sort_by(|a, b| {
            a.1.cmp(&b.1)
                .then(a.0.partial_cmp(&b.0).expect("penalties are finite"))
                .then(a.2.cmp(&b.2))
        });
        if at_zero.len() < 2 {
            return Err(conflict());
        }
        let zero_edges = [(0, at_zero[0].2), (0, at_zero[1].2)];
        penalised_total += at_zero[0].0 + at_zero[1].0;
        degrees[0] += 2;
        degrees[at_zero[0].2 as usize] += 1;
        degrees[at_zero[1].2 as usize] += 1;

        let bound = penalised_total - 2.0 * self.penalties.iter().sum::<f64>();
        Ok(OneTree {
            tree_edges,
            zero_edges,
            bound,
            degrees,
            penalties: self.penalties.clone(),
        })
    }

    /// Subgradient ascent on the node penalties; returns the best one-tree encountered.
    fn optimise_penalties(
        &mut self,
        context: &impl ReadDomains,
        edges: &[(u32, u32)],
    ) -> Result<OneTree, Conflict> {
        let num_nodes = context.num_nodes(self.graph);
        let upper_bound = context.upper_bound(&self.cost) as f64;

        let mut best: Option<OneTree> = None;
        let mut lambda = 2.0;
        for _ in 0..=self.iteration_budget {
            let tree = self.build_one_tree(context, edges)?;
            let improved = best
                .as_ref()
                .map_or(true, |incumbent| tree.bound > incumbent.bound);

            let norm: f64 = tree
                .degrees
                .iter()
                .map(|&d| {
                    let gap = d as f64 - 2.0;
                    gap * gap
                })
                .sum();
            let finished = norm == 0.0;
            let step_target = if upper_bound < i32::MAX as f64 {
                upper_bound
            } else {
                tree.bound.abs() * 0.1 + num_nodes as f64
            };
            let step = lambda * (step_target - tree.bound).max(1.0) / norm.max(1.0);

            if improved {
                best = Some(tree.clone());
            }
            if finished {
                break;
            }

            for (node, &degree) in tree.degrees.iter().enumerate() {
                self.penalties[node] += step * (degree as f64 - 2.0);
            }
            lambda *= 0.95;
        }

        Ok(best.expect("at least one iteration ran"))
    }

    /// Marginal-cost filtering against the best one-tree.
    fn filter_edges(
        &self,
        context: &mut PropagationContextMut,
        tree: &OneTree,
        edges: &[(u32, u32)],
    ) -> PropagationStatusCP {
        let num_nodes = context.num_nodes(self.graph);
        let budget = context.upper_bound(&self.cost) as f64;
        let weight_of = |i: u32, j: u32| self.penalised_weight(&tree.penalties, i, j);

        // Heaviest tree edge on the path between every pair of inner nodes.
        let mut adjacency: Vec<Vec<(u32, f64)>> = vec![Vec::new(); num_nodes];
        for &(i, j) in &tree.tree_edges {
            let weight = weight_of(i, j);
            adjacency[i as usize].push((j, weight));
            adjacency[j as usize].push((i, weight));
        }
        let mut max_on_path = vec![0.0f64; num_nodes * num_nodes];
        for start in 1..num_nodes as u32 {
            let mut stack = vec![start];
            let mut visited = vec![false; num_nodes];
            visited[start as usize] = true;
            while let Some(node) = stack.pop() {
                for &(next, weight) in &adjacency[node as usize] {
                    if visited[next as usize] {
                        continue;
                    }
                    visited[next as usize] = true;
                    let through = max_on_path[start as usize * num_nodes + node as usize];
                    max_on_path[start as usize * num_nodes + next as usize] =
                        through.max(weight);
                    stack.push(next);
                }
            }
        }

        let in_tree = |i: u32, j: u32| {
            tree.tree_edges.contains(&(i, j))
                || tree.zero_edges.contains(&(i, j))
                || tree.zero_edges.contains(&(j, i))
        };

        // Removal: non-tree edges whose insertion cannot stay within budget.
        let costlier_zero = weight_of(tree.zero_edges[1].0, tree.zero_edges[1].1);
        for &(i, j) in edges {
            if in_tree(i, j)
                || context.is_arc_in_kernel(self.graph, i, j)
                || !context.is_arc_in_envelope(self.graph, i, j)
            {
                continue;
            }
            let reduced = if i == 0 {
                weight_of(i, j) - costlier_zero
            } else {
                weight_of(i, j) - max_on_path[i as usize * num_nodes + j as usize]
            };
            if tree.bound + reduced > budget + EPSILON {
                context.remove_arc(self.graph, i, j)?;
            }
        }

        // Enforcement: tree edges whose cheapest replacement cannot stay within budget.
        for &(a, b) in &tree.tree_edges {
            if context.is_arc_in_kernel(self.graph, a, b) {
                continue;
            }
            // The side of the split containing `a` once (a, b) is dropped.
            let mut side = vec![false; num_nodes];
            side[a as usize] = true;
            let mut stack = vec![a];
            while let Some(node) = stack.pop() {
                for &(next, _) in &adjacency[node as usize] {
                    if (node == a && next == b) || (node == b && next == a) {
                        continue;
                    }
                    if !side[next as usize] {
                        side[next as usize] = true;
                        stack.push(next);
                    }
                }
            }

            let replacement = edges
                .iter()
                .filter(|&&(u, v)| {
                    u >= 1
                        && (u, v) != (a, b)
                        && side[u as usize] != side[v as usize]
                        && context.is_arc_in_envelope(self.graph, u, v)
                })
                .map(|&(u, v)| weight_of(u, v))
                .fold(f64::INFINITY, f64::min);

            if replacement == f64::INFINITY
                || tree.bound + (replacement - weight_of(a, b)) > budget + EPSILON
            {
                context.enforce_arc(self.graph, a, b)?;
            }
        }

        // The edges at node 0: replacement is the third cheapest.
        let mut spare: Option<f64> = None;
        for j in context
            .envelope_successors(self.graph, 0)
            .collect::<Vec<_>>()
        {
            if (0, j) == tree.zero_edges[0] || (0, j) == tree.zero_edges[1] {
                continue;
            }
            let weight = weight_of(0, j);
            spare = Some(spare.map_or(weight, |s: f64| s.min(weight)));
        }
        for &(_, j) in &tree.zero_edges {
            if context.is_arc_in_kernel(self.graph, 0, j) {
                continue;
            }
            let forced = match spare {
                None => true,
                Some(third) => tree.bound + (third - weight_of(0, j)) > budget + EPSILON,
            };
            if forced {
                context.enforce_arc(self.graph, 0, j)?;
            }
        }

        Ok(())
    }
}

impl Propagator for OneTreeRelaxationPropagator {
    fn name(&self) -> &str {
        "OneTreeRelaxation"
    }

    fn priority(&self) -> Priority {
        Priority::VerySlow
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP {
        assert!(
            !context.graph_assignments().is_directed(self.graph),
            "the one-tree relaxation applies to undirected graphs"
        );
        assert_eq!(self.weights.len(), context.num_nodes(self.graph));

        self.penalties = vec![0.0; context.num_nodes(self.graph)];
        context.register_graph(self.graph, GraphEvents::ANY_GRAPH, LocalId::from(0));
        context.register(self.cost, DomainEvents::BOUNDS, LocalId::from(1));
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        if self.wait_first_solution && context.solution_count() == 0 {
            return Ok(());
        }

        let num_nodes = context.num_nodes(self.graph);
        if num_nodes < 2 {
            return Ok(());
        }
        if num_nodes == 2 {
            // Degenerate tour: the single edge must be taken.
            if !context.is_arc_in_envelope(self.graph, 0, 1) {
                return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
            }
            if !context.is_arc_in_kernel(self.graph, 0, 1) {
                context.enforce_arc(self.graph, 0, 1)?;
            }
            return context.set_lower_bound(
                &self.cost,
                self.weights[0][1].clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            );
        }

        let edges = self.envelope_edges(&context);
        let best = self.optimise_penalties(&context, &edges)?;

        let bound = (best.bound - EPSILON).ceil() as i64;
        context.set_lower_bound(
            &self.cost,
            bound.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        )?;

        self.filter_edges(&mut context, &best, &edges)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::cp::test_solver::TestSolver;
    use crate::variables::edge_sets::complete_edges;
    use super::*;

    /// Cyclic distances `min(|i - j|, n - |i - j|)`: the optimal tour visits the nodes in
    /// order and costs exactly `n`, and the one-tree bound is tight.
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

    #[test]
    fn a_two_node_graph_finds_the_unique_edge_immediately() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(2, &[(0, 1)]);
        let cost = solver.new_variable(0, 100);
        let _ = solver
            .new_propagator(OneTreeRelaxationPropagator::new(
                g,
                cost,
                vec![vec![0, 7], vec![7, 0]],
                10,
                false,
            ))
            .expect("consistent at the root");

        assert!(solver.is_arc_in_kernel(g, 0, 1));
        assert_eq!(solver.lower_bound(cost), 7);
    }

    #[test]
    fn the_bound_is_tight_on_a_ring() {
        let mut solver = TestSolver::default();
        let n = 10;
        let g = solver.new_undirected_graph(n, &complete_edges(n as u32));
        let cost = solver.new_variable(0, 1000);
        let _ = solver
            .new_propagator(OneTreeRelaxationPropagator::new(
                g,
                cost,
                ring_weights(n),
                100,
                false,
            ))
            .expect("consistent at the root");

        // The optimum is exactly n; the relaxation must reach it (well within 0.5%).
        assert_eq!(solver.lower_bound(cost), n as i32);
    }

    #[test]
    fn a_tight_budget_removes_the_chords() {
        let mut solver = TestSolver::default();
        let n = 6;
        let g = solver.new_undirected_graph(n, &complete_edges(n as u32));
        let cost = solver.new_variable(0, 6);
        let _ = solver
            .new_propagator(OneTreeRelaxationPropagator::new(
                g,
                cost,
                ring_weights(n),
                50,
                false,
            ))
            .expect("consistent at the root");

        // Every chord makes the tour longer than the budget of 6.
        assert!(!solver.is_arc_in_envelope(g, 0, 2));
        assert!(!solver.is_arc_in_envelope(g, 1, 4));
        // The ring edges survive.
        assert!(solver.is_arc_in_envelope(g, 0, 1));
        assert!(solver.is_arc_in_envelope(g, 4, 5));
    }

    #[test]
    fn a_budget_below_the_bound_is_a_contradiction() {
        let mut solver = TestSolver::default();
        let n = 6;
        let g = solver.new_undirected_graph(n, &complete_edges(n as u32));
        let cost = solver.new_variable(0, 5);

        let result = solver.new_propagator(OneTreeRelaxationPropagator::new(
            g,
            cost,
            ring_weights(n),
            50,
            false,
        ));
        assert!(result.is_err());
    }

    #[test]
    fn waiting_for_a_first_solution_keeps_the_propagator_dormant() {
        let mut solver = TestSolver::default();
        let n = 6;
        let g = solver.new_undirected_graph(n, &complete_edges(n as u32));
        let cost = solver.new_variable(0, 5);

        // The same infeasible budget as above, but gated: nothing happens.
        let _ = solver
            .new_propagator(OneTreeRelaxationPropagator::new(
                g,
                cost,
                ring_weights(n),
                50,
                true,
            ))
            .expect("dormant until a solution exists");
        assert_eq!(solver.lower_bound(cost), 0);
    }
}
