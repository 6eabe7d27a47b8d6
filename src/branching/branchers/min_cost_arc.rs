use crate::branching::Brancher;
use crate::branching::Decision;
use crate::branching::SelectionContext;
use crate::variables::GraphId;

/// Branches on the cheapest undetermined arc of the graph, enforcing it on the first branch.
/// Ties are broken lexicographically. The natural strategy for cost-minimising tour models.
#[derive(Clone, Debug)]
pub struct MinCostArcBrancher {
    graph: GraphId,
    weights: Vec<Vec<i64>>,
}

impl MinCostArcBrancher {
    pub fn new(graph: GraphId, weights: Vec<Vec<i64>>) -> Self {
        MinCostArcBrancher { graph, weights }
    }
}

impl Brancher for MinCostArcBrancher {
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Decision> {
        let n = context.num_nodes(self.graph) as u32;
        let directed = context.is_graph_directed(self.graph);

        let mut best: Option<(i64, u32, u32)> = None;
        for from in 0..n {
            for to in 0..n {
                if !directed && to < from {
                    continue;
                }
                if !context.is_arc_in_envelope(self.graph, from, to)
                    || context.is_arc_in_kernel(self.graph, from, to)
                {
                    continue;
                }
                let weight = self.weights[from as usize][to as usize];
                if best.map_or(true, |(w, _, _)| weight < w) {
                    best = Some((weight, from, to));
                }
            }
        }

        best.map(|(_, from, to)| Decision::EnforceArc(self.graph, from, to))
    }
}
