use crate::basic_types::Conflict;
use crate::basic_types::ConflictReason;
use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::domain_events::GraphEvents;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::ReadDomains;
use crate::variables::GraphId;

/// Redundant arc-consistent "all successors different" filtering for directed tour graphs:
/// every node owns exactly one outgoing arc in the final graph and no two nodes may share a
/// successor.
///
/// Implements the matching-based filtering of Régin: a maximum bipartite matching between
/// nodes and successor candidates must be perfect, and a possible arc that lies in no maximum
/// matching (it is non-matching and crosses strongly connected components of the residual
/// graph) is removed. Posted as a redundant propagator through the `alldiff_ac` option.
#[derive(Clone, Debug)]
pub(crate) struct AllDifferentSuccessorsPropagator {
    graph: GraphId,
}

impl AllDifferentSuccessorsPropagator {
    pub(crate) fn new(graph: GraphId) -> Self {
        AllDifferentSuccessorsPropagator { graph }
    }

    fn try_augment(
        &self,
        context: &impl ReadDomains,
        node: u32,
        matched_left: &mut [Option<u32>],
        matched_right: &mut [Option<u32>],
        visited: &mut [bool],
    ) -> bool {
        let successors: Vec<u32> = context.envelope_successors(self.graph, node).collect();
        for candidate in successors {
            if visited[candidate as usize] {
                continue;
            }
            visited[candidate as usize] = true;
            let free = match matched_right[candidate as usize] {
                None => true,
                // A node whose successor is mandatory cannot be re-matched elsewhere.
                Some(owner) => {
                    context
                        .kernel_successors(self.graph, owner)
                        .next()
                        .is_none()
                        && self.try_augment(context, owner, matched_left, matched_right, visited)
                }
            };
            if free {
                matched_left[node as usize] = Some(candidate);
                matched_right[candidate as usize] = Some(node);
                return true;
            }
        }
        false
    }

    /// Tarjan's strongly connected components over the residual graph, iteratively. Vertices
    /// `0..n` are the nodes, `n..2n` the successor side.
    fn residual_sccs(
        &self,
        context: &impl ReadDomains,
        matched_left: &[Option<u32>],
    ) -> Vec<u32> {
        let n = context.num_nodes(self.graph);
        let num_vertices = 2 * n;
        let neighbours = |vertex: usize| -> Vec<usize> {
            if vertex < n {
                // Left to right along non-matching arcs.
                context
                    .envelope_successors(self.graph, vertex as u32)
                    .filter(|&to| matched_left[vertex] != Some(to))
                    .map(|to| n + to as usize)
                    .collect()
            } else {
                // Right to left along the matching arc.
                match matched_left
                    .iter()
                    .position(|&m| m == Some((vertex - n) as u32))
                {
                    Some(owner) => vec![owner],
                    None => Vec::new(),
                }
            }
        };

        let mut index = vec![usize::MAX; num_vertices];
        let mut low = vec![0usize; num_vertices];
        let mut on_stack = vec![false; num_vertices];
        let mut stack: Vec<usize> = Vec::new();
        let mut scc = vec![0u32; num_vertices];
        let mut next_index = 0usize;
        let mut next_scc = 0u32;

        for root in 0..num_vertices {
            if index[root] != usize::MAX {
                continue;
            }
            // Explicit DFS frames: (vertex, neighbour list, cursor).
            let mut frames: Vec<(usize, Vec<usize>, usize)> = vec![(root, neighbours(root), 0)];
            index[root] = next_index;
            low[root] = next_index;
            next_index += 1;
            stack.push(root);
            on_stack[root] = true;

            while let Some(frame) = frames.last_mut() {
                let (vertex, adjacency, cursor) = (frame.0, frame.1.clone(), frame.2);
                if cursor < adjacency.len() {
                    frame.2 += 1;
                    let next = adjacency[cursor];
                    if index[next] == usize::MAX {
                        index[next] = next_index;
                        low[next] = next_index;
                        next_index += 1;
                        stack.push(next);
                        on_stack[next] = true;
                        frames.push((next, neighbours(next), 0));
                    } else if on_stack[next] {
                        low[vertex] = low[vertex].min(index[next]);
                    }
                } else {
                    let _ = frames.pop();
                    if let Some(parent) = frames.last() {
                        low[parent.0] = low[parent.0].min(low[vertex]);
                    }
                    if low[vertex] == index[vertex] {
                        loop {
                            let member = stack.pop().expect("component members are on the stack");
                            on_stack[member] = false;
                            scc[member] = next_scc;
                            if member == vertex {
                                break;
                            }
                        }
                        next_scc += 1;
                    }
                }
            }
        }
        scc
    }
}

impl Propagator for AllDifferentSuccessorsPropagator {
    fn name(&self) -> &str {
        "AllDifferentSuccessors"
    }

    fn priority(&self) -> Priority {
        Priority::Quadratic
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP {
        assert!(
            context.graph_assignments().is_directed(self.graph),
            "AllDifferentSuccessors applies to directed graphs"
        );
        context.register_graph(self.graph, GraphEvents::ANY_GRAPH, LocalId::from(0));
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let n = context.num_nodes(self.graph);

        let mut matched_left: Vec<Option<u32>> = vec![None; n];
        let mut matched_right: Vec<Option<u32>> = vec![None; n];
        // Mandatory successors are fixed into the matching.
        for node in 0..n as u32 {
            if let Some(successor) = context.kernel_successors(self.graph, node).next() {
                if matched_right[successor as usize].is_some() {
                    return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
                }
                matched_left[node as usize] = Some(successor);
                matched_right[successor as usize] = Some(node);
            }
        }
        for node in 0..n as u32 {
            if matched_left[node as usize].is_some()
                || context.envelope_out_degree(self.graph, node) == 0
            {
                continue;
            }
            let mut visited = vec![false; n];
            if !self.try_augment(
                &context,
                node,
                &mut matched_left,
                &mut matched_right,
                &mut visited,
            ) {
                return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
            }
        }

        // The SCC argument only removes arcs when no free vertices remain on either side
        // (a path's destination leaves its own id unmatched, for instance); alternating
        // paths through free vertices would otherwise keep arcs alive across components.
        if matched_right.iter().any(|m| m.is_none()) {
            return Ok(());
        }

        let scc = self.residual_sccs(&context, &matched_left);
        for node in 0..n as u32 {
            let removable: Vec<u32> = context
                .envelope_successors(self.graph, node)
                .filter(|&to| {
                    matched_left[node as usize] != Some(to)
                        && !context.is_arc_in_kernel(self.graph, node, to)
                        && scc[node as usize] != scc[n + to as usize]
                })
                .collect();
            for to in removable {
                context.remove_arc(self.graph, node, to)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::cp::test_solver::TestSolver;
    use super::*;

    #[test]
    fn a_shared_mandatory_successor_fails() {
        let mut solver = TestSolver::default();
        let g = solver.new_directed_graph(3, &[(0, 2), (1, 2), (2, 0), (2, 1), (0, 1)]);
        let _ = solver
            .new_propagator(AllDifferentSuccessorsPropagator::new(g))
            .expect("consistent at the root");

        solver.enforce_arc_and_propagate(g, 0, 2).expect("feasible");
        assert!(solver.enforce_arc_and_propagate(g, 1, 2).is_err());
    }

    #[test]
    fn arcs_in_no_maximum_matching_are_removed() {
        let mut solver = TestSolver::default();
        // Node 1 must take successor 2 and node 2 must take successor 1; node 0's arc to
        // either of them can never be part of a perfect successor assignment.
        let g = solver.new_directed_graph(3, &[(0, 0), (0, 1), (1, 2), (2, 1)]);
        let _ = solver
            .new_propagator(AllDifferentSuccessorsPropagator::new(g))
            .expect("consistent at the root");

        assert!(!solver.is_arc_in_envelope(g, 0, 1));
        assert!(solver.is_arc_in_envelope(g, 0, 0));
    }

    #[test]
    fn an_infeasible_assignment_is_detected() {
        let mut solver = TestSolver::default();
        // Both nodes can only use successor 0.
        let g = solver.new_directed_graph(2, &[(0, 0), (1, 0)]);
        let result = solver.new_propagator(AllDifferentSuccessorsPropagator::new(g));
        assert!(result.is_err());
    }
}
