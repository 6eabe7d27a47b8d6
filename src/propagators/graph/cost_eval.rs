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

fn clamp_to_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Propagates `cost = Σ W(e) over the edges of the final cycle` for an undirected tour graph.
///
/// The lower bound is the weight of the mandatory edges plus, for every node that still
/// misses incident edges, the cheapest possible completions (halved, as every missing edge
/// serves two nodes). Possible edges too expensive for the remaining budget are removed, and
/// an instantiated graph pins the cost down.
#[derive(Clone, Debug)]
pub(crate) struct CycleCostPropagator {
    graph: GraphId,
    cost: DomainId,
    weights: Vec<Vec<i64>>,
}

impl CycleCostPropagator {
    pub(crate) fn new(graph: GraphId, cost: DomainId, weights: Vec<Vec<i64>>) -> Self {
        CycleCostPropagator {
            graph,
            cost,
            weights,
        }
    }
}

impl Propagator for CycleCostPropagator {
    fn name(&self) -> &str {
        "CycleCost"
    }

    fn priority(&self) -> Priority {
        Priority::Linear
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP {
        assert!(
            !context.graph_assignments().is_directed(self.graph),
            "CycleCost applies to undirected graphs"
        );
        assert_eq!(self.weights.len(), context.num_nodes(self.graph));

        context.register_graph(self.graph, GraphEvents::ANY_GRAPH, LocalId::from(0));
        context.register(self.cost, DomainEvents::BOUNDS, LocalId::from(1));
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let num_nodes = context.num_nodes(self.graph) as u32;

        let mut kernel_weight = 0i64;
        for i in 0..num_nodes {
            for j in context.kernel_successors(self.graph, i) {
                if i < j {
                    kernel_weight += self.weights[i as usize][j as usize];
                }
            }
        }

        // The cheapest completions of every node still missing cycle edges.
        let mut completion = 0i64;
        for i in 0..num_nodes {
            let kernel_degree = context.kernel_out_degree(self.graph, i);
            if kernel_degree >= 2 {
                continue;
            }
            let needed = (2 - kernel_degree) as usize;

            let mut cheapest: Vec<i64> = context
                .envelope_successors(self.graph, i)
                .filter(|&j| !context.is_arc_in_kernel(self.graph, i, j))
                .map(|j| self.weights[i as usize][j as usize])
                .collect();
            if cheapest.len() < needed {
                return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
            }
            cheapest.sort_unstable();
            completion += cheapest[..needed].iter().sum::<i64>();
        }

        // Each missing edge is counted at both of its endpoints.
        let lower_bound = kernel_weight + (completion + 1) / 2;
        context.set_lower_bound(&self.cost, clamp_to_i32(lower_bound))?;

        if context.is_graph_assigned(self.graph) {
            context.set_upper_bound(&self.cost, clamp_to_i32(kernel_weight))?;
            return Ok(());
        }

        // Prune edges that cannot fit the remaining budget on top of the mandatory weight.
        let budget = context.upper_bound(&self.cost) as i64;
        for i in 0..num_nodes {
            let too_expensive: Vec<u32> = context
                .envelope_successors(self.graph, i)
                .filter(|&j| i < j && !context.is_arc_in_kernel(self.graph, i, j))
                .filter(|&j| kernel_weight + self.weights[i as usize][j as usize] > budget)
                .collect();
            for j in too_expensive {
                context.remove_arc(self.graph, i, j)?;
            }
        }
        Ok(())
    }
}

/// The directed counterpart for a Hamiltonian path: the lower bound completes every node
/// without a mandatory successor (except the destination) with its cheapest possible
/// outgoing arc.
#[derive(Clone, Debug)]
pub(crate) struct PathCostPropagator {
    graph: GraphId,
    cost: DomainId,
    weights: Vec<Vec<i64>>,
    destination: u32,
}

impl PathCostPropagator {
    pub(crate) fn new(
        graph: GraphId,
        cost: DomainId,
        weights: Vec<Vec<i64>>,
        destination: u32,
    ) -> Self {
        PathCostPropagator {
            graph,
            cost,
            weights,
            destination,
        }
    }
}

impl Propagator for PathCostPropagator {
    fn name(&self) -> &str {
        "PathCost"
    }

    fn priority(&self) -> Priority {
        Priority::Linear
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP {
        assert!(
            context.graph_assignments().is_directed(self.graph),
            "PathCost applies to directed graphs"
        );
        assert_eq!(self.weights.len(), context.num_nodes(self.graph));

        context.register_graph(self.graph, GraphEvents::ANY_GRAPH, LocalId::from(0));
        context.register(self.cost, DomainEvents::BOUNDS, LocalId::from(1));
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let num_nodes = context.num_nodes(self.graph) as u32;

        let mut kernel_weight = 0i64;
        for i in 0..num_nodes {
            for j in context.kernel_successors(self.graph, i) {
                kernel_weight += self.weights[i as usize][j as usize];
            }
        }

        let mut completion = 0i64;
        for i in 0..num_nodes {
            if i == self.destination || context.kernel_out_degree(self.graph, i) > 0 {
                continue;
            }
            let cheapest = context
                .envelope_successors(self.graph, i)
                .map(|j| self.weights[i as usize][j as usize])
                .min();
            match cheapest {
                Some(weight) => completion += weight,
                None => return Err(Conflict::graph(self.graph, ConflictReason::Unknown)),
            }
        }

        context.set_lower_bound(&self.cost, clamp_to_i32(kernel_weight + completion))?;

        if context.is_graph_assigned(self.graph) {
            context.set_upper_bound(&self.cost, clamp_to_i32(kernel_weight))?;
            return Ok(());
        }

        let budget = context.upper_bound(&self.cost) as i64;
        for i in 0..num_nodes {
            let too_expensive: Vec<u32> = context
                .envelope_successors(self.graph, i)
                .filter(|&j| !context.is_arc_in_kernel(self.graph, i, j))
                .filter(|&j| kernel_weight + self.weights[i as usize][j as usize] > budget)
                .collect();
            for j in too_expensive {
                context.remove_arc(self.graph, i, j)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::cp::test_solver::TestSolver;
    use crate::variables::edge_sets::complete_arcs;
    use crate::variables::edge_sets::complete_edges;
    use super::*;

    fn uniform_weights(num_nodes: usize, weight: i64) -> Vec<Vec<i64>> {
        vec![vec![weight; num_nodes]; num_nodes]
    }

    #[test]
    fn the_cycle_bound_counts_every_node_completion() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(4, &complete_edges(4));
        let cost = solver.new_variable(0, 100);
        let _ = solver
            .new_propagator(CycleCostPropagator::new(g, cost, uniform_weights(4, 1)))
            .expect("consistent at the root");

        // Four nodes, each needing two unit edges, halved: at least 4.
        assert_eq!(solver.lower_bound(cost), 4);
    }

    #[test]
    fn an_instantiated_cycle_pins_the_cost() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(4, &[(0, 1), (1, 2), (2, 3), (0, 3)]);
        let cost = solver.new_variable(0, 100);
        let _ = solver
            .new_propagator(CycleCostPropagator::new(g, cost, uniform_weights(4, 2)))
            .expect("consistent at the root");

        for (i, j) in [(0, 1), (1, 2), (2, 3), (0, 3)] {
            solver.enforce_arc_and_propagate(g, i, j).expect("feasible");
        }
        assert!(solver.is_graph_assigned(g));
        solver.assert_bounds(cost, 8, 8);
    }

    #[test]
    fn tightening_the_budget_prunes_more_edges() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(4, &complete_edges(4));
        let mut weights = uniform_weights(4, 1);
        weights[0][3] = 5;
        weights[3][0] = 5;
        let cost = solver.new_variable(0, 100);
        let _ = solver
            .new_propagator(CycleCostPropagator::new(g, cost, weights))
            .expect("consistent at the root");

        assert!(solver.is_arc_in_envelope(g, 0, 3));
        solver
            .set_upper_bound_and_propagate(cost, 4)
            .expect("the uniform tour fits");
        assert!(!solver.is_arc_in_envelope(g, 0, 3));
    }

    #[test]
    fn edges_beyond_the_budget_are_pruned() {
        let mut solver = TestSolver::default();
        let g = solver.new_undirected_graph(4, &complete_edges(4));
        let mut weights = uniform_weights(4, 1);
        weights[0][3] = 50;
        weights[3][0] = 50;
        let cost = solver.new_variable(0, 10);
        let _ = solver
            .new_propagator(CycleCostPropagator::new(g, cost, weights))
            .expect("consistent at the root");

        assert!(!solver.is_arc_in_envelope(g, 0, 3));
        assert!(solver.is_arc_in_envelope(g, 0, 1));
    }

    #[test]
    fn the_path_bound_sums_cheapest_outgoing_arcs() {
        let mut solver = TestSolver::default();
        let n = 5u32;
        let mut weights = vec![vec![0i64; n as usize]; n as usize];
        for i in 0..n as usize {
            for j in 0..n as usize {
                weights[i][j] = (i as i64 - j as i64).abs();
            }
        }
        let g = solver.new_directed_graph(n as usize, &complete_arcs(n, false));
        let cost = solver.new_variable(0, 100);
        let _ = solver
            .new_propagator(PathCostPropagator::new(g, cost, weights, 4))
            .expect("consistent at the root");

        // Every node except the destination moves at least distance 1.
        assert_eq!(solver.lower_bound(cost), 4);
    }
}
