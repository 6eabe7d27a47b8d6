use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::branching::Brancher;
use crate::branching::Decision;
use crate::branching::SelectionContext;
use crate::variables::GraphId;

/// Branches on a uniformly random undetermined arc. Useful together with restarts to
/// diversify the search; seeded, so runs remain reproducible.
#[derive(Clone, Debug)]
pub struct RandomArcBrancher {
    graph: GraphId,
    rng: SmallRng,
}

impl RandomArcBrancher {
    pub fn new(graph: GraphId, seed: u64) -> Self {
        RandomArcBrancher {
            graph,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Brancher for RandomArcBrancher {
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Decision> {
        let n = context.num_nodes(self.graph) as u32;
        let directed = context.is_graph_directed(self.graph);

        let mut candidates = Vec::new();
        for from in 0..n {
            for to in 0..n {
                if !directed && to < from {
                    continue;
                }
                if context.is_arc_in_envelope(self.graph, from, to)
                    && !context.is_arc_in_kernel(self.graph, from, to)
                {
                    candidates.push((from, to));
                }
            }
        }

        if candidates.is_empty() {
            return None;
        }
        let (from, to) = candidates[self.rng.gen_range(0..candidates.len())];
        Some(Decision::EnforceArc(self.graph, from, to))
    }
}
