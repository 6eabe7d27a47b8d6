use crate::branching::Brancher;
use crate::branching::Decision;
use crate::branching::SelectionContext;
use crate::variables::GraphId;

/// Branches on the lexicographically first undetermined arc of the graph, enforcing it on the
/// first branch. Deterministic; the baseline strategy for graph models.
#[derive(Clone, Copy, Debug)]
pub struct FirstEnvelopeArcBrancher {
    graph: GraphId,
}

impl FirstEnvelopeArcBrancher {
    pub fn new(graph: GraphId) -> Self {
        FirstEnvelopeArcBrancher { graph }
    }
}

impl Brancher for FirstEnvelopeArcBrancher {
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Decision> {
        let n = context.num_nodes(self.graph) as u32;
        let directed = context.is_graph_directed(self.graph);

        for from in 0..n {
            for to in 0..n {
                if !directed && to < from {
                    continue;
                }
                if context.is_arc_in_envelope(self.graph, from, to)
                    && !context.is_arc_in_kernel(self.graph, from, to)
                {
                    return Some(Decision::EnforceArc(self.graph, from, to));
                }
            }
        }
        None
    }
}
