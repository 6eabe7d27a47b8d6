use fixedbitset::FixedBitSet;

use crate::basic_types::Cause;
use crate::basic_types::Conflict;
use crate::basic_types::ConflictReason;
use crate::basic_types::PropagationStatusCP;
use crate::basic_types::Trail;
use crate::containers::KeyedVec;
use crate::containers::SparseSet;
use crate::marrow_assert_simple;
use crate::variables::GraphId;
use super::domain_events::GraphUpdate;

/// The graph domain store: each graph variable is a kernel/envelope pair of graphs over the
/// nodes `0..n`, with the kernel holding the mandatory nodes and arcs and the envelope the
/// possible ones.
///
/// The kernel only grows and the envelope only shrinks within a decision level, and
/// `kernel ⊆ envelope` holds at all times: an arc can only be enforced while it is still
/// possible, and removing a mandatory arc is a contradiction. Like the integer store, every
/// change pushes one trail entry and buffers one event.
#[derive(Clone, Debug, Default)]
pub struct GraphAssignments {
    trail: Trail<GraphTrailEntry>,
    graphs: KeyedVec<GraphId, GraphDomain>,
    events: Vec<(GraphId, GraphUpdate, Cause)>,
}

#[derive(Clone, Copy, Debug)]
enum GraphTrailEntry {
    ArcEnforced { graph: GraphId, from: u32, to: u32 },
    ArcRemoved { graph: GraphId, from: u32, to: u32 },
    NodeEnforced { graph: GraphId, node: u32 },
    NodeRemoved { graph: GraphId, node: u32 },
}

#[derive(Clone, Debug)]
struct GraphDomain {
    num_nodes: usize,
    directed: bool,
    envelope_nodes: SparseSet,
    kernel_nodes: FixedBitSet,
    num_kernel_nodes: usize,
    /// Envelope adjacency, one sparse set per node. For undirected graphs the rows are kept
    /// symmetric and also serve as the predecessor rows.
    envelope_succ: Vec<SparseSet>,
    envelope_pred: Vec<SparseSet>,
    kernel_succ: Vec<FixedBitSet>,
    kernel_pred: Vec<FixedBitSet>,
    kernel_out_degree: Vec<u32>,
    kernel_in_degree: Vec<u32>,
    /// Arc counts; for undirected graphs every edge is counted once.
    num_kernel_arcs: usize,
    num_envelope_arcs: usize,
}

impl GraphDomain {
    fn canonical(&self, from: u32, to: u32) -> (u32, u32) {
        if self.directed || from <= to {
            (from, to)
        } else {
            (to, from)
        }
    }
}

impl GraphAssignments {
    pub(crate) fn increase_decision_level(&mut self) {
        self.trail.open_level()
    }

    pub(crate) fn num_graphs(&self) -> usize {
        self.graphs.len()
    }

    /// Registers a new graph variable. All nodes start in the kernel when `mandatory_nodes` is
    /// set, which is what the graph constraints of this crate assume; otherwise nodes start as
    /// merely possible.
    pub(crate) fn grow(
        &mut self,
        num_nodes: usize,
        directed: bool,
        arcs: &[(u32, u32)],
        mandatory_nodes: bool,
    ) -> GraphId {
        marrow_assert_simple!(
            self.trail.current_level() == 0,
            "graph variables can only be created at the root"
        );

        let mut in_envelope = vec![FixedBitSet::with_capacity(num_nodes); num_nodes];
        let mut in_envelope_rev = vec![FixedBitSet::with_capacity(num_nodes); num_nodes];
        let mut num_envelope_arcs = 0;
        for &(from, to) in arcs {
            let (from, to) = if directed || from <= to {
                (from, to)
            } else {
                (to, from)
            };
            marrow_assert_simple!((from as usize) < num_nodes && (to as usize) < num_nodes);
            if in_envelope[from as usize].contains(to as usize) {
                continue;
            }
            in_envelope[from as usize].insert(to as usize);
            in_envelope_rev[to as usize].insert(from as usize);
            if !directed {
                in_envelope[to as usize].insert(from as usize);
                in_envelope_rev[from as usize].insert(to as usize);
            }
            num_envelope_arcs += 1;
        }

        let sparse_rows = |membership: &[FixedBitSet]| {
            membership
                .iter()
                .map(|row| {
                    let mut set = SparseSet::full(num_nodes);
                    for node in 0..num_nodes {
                        if !row.contains(node) {
                            set.remove(node as u32);
                        }
                    }
                    set
                })
                .collect::<Vec<_>>()
        };

        let envelope_succ = sparse_rows(&in_envelope);
        let envelope_pred = if directed {
            sparse_rows(&in_envelope_rev)
        } else {
            Vec::new()
        };

        let mut kernel_nodes = FixedBitSet::with_capacity(num_nodes);
        if mandatory_nodes {
            kernel_nodes.insert_range(..);
        }

        self.graphs.push(GraphDomain {
            num_nodes,
            directed,
            envelope_nodes: SparseSet::full(num_nodes),
            kernel_nodes,
            num_kernel_nodes: if mandatory_nodes { num_nodes } else { 0 },
            envelope_succ,
            envelope_pred,
            kernel_succ: vec![FixedBitSet::with_capacity(num_nodes); num_nodes],
            kernel_pred: if directed {
                vec![FixedBitSet::with_capacity(num_nodes); num_nodes]
            } else {
                Vec::new()
            },
            kernel_out_degree: vec![0; num_nodes],
            kernel_in_degree: vec![0; num_nodes],
            num_kernel_arcs: 0,
            num_envelope_arcs,
        })
    }

    pub(crate) fn drain_events(&mut self) -> Vec<(GraphId, GraphUpdate, Cause)> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn discard_events(&mut self) {
        self.events.clear();
    }

    /// Undoes every change made since the given decision level was opened.
    pub(crate) fn synchronise(&mut self, new_decision_level: usize) {
        let graphs = &mut self.graphs;
        self.trail
            .close_levels_down_to(new_decision_level, |entry| match entry {
                GraphTrailEntry::ArcEnforced { graph, from, to } => {
                    let g = &mut graphs[graph];
                    g.kernel_succ[from as usize].set(to as usize, false);
                    g.kernel_out_degree[from as usize] -= 1;
                    g.kernel_in_degree[to as usize] -= 1;
                    if g.directed {
                        g.kernel_pred[to as usize].set(from as usize, false);
                    } else if from != to {
                        g.kernel_succ[to as usize].set(from as usize, false);
                        g.kernel_out_degree[to as usize] -= 1;
                        g.kernel_in_degree[from as usize] -= 1;
                    }
                    g.num_kernel_arcs -= 1;
                }
                GraphTrailEntry::ArcRemoved { graph, from, to } => {
                    let g = &mut graphs[graph];
                    let len = g.envelope_succ[from as usize].len();
                    g.envelope_succ[from as usize].restore(len + 1);
                    if g.directed {
                        let len = g.envelope_pred[to as usize].len();
                        g.envelope_pred[to as usize].restore(len + 1);
                    } else if from != to {
                        let len = g.envelope_succ[to as usize].len();
                        g.envelope_succ[to as usize].restore(len + 1);
                    }
                    g.num_envelope_arcs += 1;
                }
                GraphTrailEntry::NodeEnforced { graph, node } => {
                    let g = &mut graphs[graph];
                    g.kernel_nodes.set(node as usize, false);
                    g.num_kernel_nodes -= 1;
                }
                GraphTrailEntry::NodeRemoved { graph, node: _ } => {
                    let g = &mut graphs[graph];
                    let len = g.envelope_nodes.len();
                    g.envelope_nodes.restore(len + 1);
                }
            });
    }
}

// Queries.
impl GraphAssignments {
    pub(crate) fn num_nodes(&self, graph: GraphId) -> usize {
        self.graphs[graph].num_nodes
    }

    pub(crate) fn is_directed(&self, graph: GraphId) -> bool {
        self.graphs[graph].directed
    }

    pub(crate) fn is_node_in_kernel(&self, graph: GraphId, node: u32) -> bool {
        self.graphs[graph].kernel_nodes.contains(node as usize)
    }

    pub(crate) fn is_node_in_envelope(&self, graph: GraphId, node: u32) -> bool {
        self.graphs[graph].envelope_nodes.contains(node)
    }

    pub(crate) fn is_arc_in_kernel(&self, graph: GraphId, from: u32, to: u32) -> bool {
        self.graphs[graph].kernel_succ[from as usize].contains(to as usize)
    }

    pub(crate) fn is_arc_in_envelope(&self, graph: GraphId, from: u32, to: u32) -> bool {
        self.graphs[graph].envelope_succ[from as usize].contains(to)
    }

    /// Successors in the kernel; neighbours for undirected graphs.
    pub(crate) fn kernel_successors(
        &self,
        graph: GraphId,
        node: u32,
    ) -> impl Iterator<Item = u32> + '_ {
        self.graphs[graph].kernel_succ[node as usize]
            .ones()
            .map(|n| n as u32)
    }

    pub(crate) fn kernel_predecessors(
        &self,
        graph: GraphId,
        node: u32,
    ) -> impl Iterator<Item = u32> + '_ {
        let g = &self.graphs[graph];
        let row = if g.directed {
            &g.kernel_pred[node as usize]
        } else {
            &g.kernel_succ[node as usize]
        };
        row.ones().map(|n| n as u32)
    }

    /// Successors in the envelope; neighbours for undirected graphs.
    pub(crate) fn envelope_successors(
        &self,
        graph: GraphId,
        node: u32,
    ) -> impl Iterator<Item = u32> + '_ {
        self.graphs[graph].envelope_succ[node as usize].iter()
    }

    pub(crate) fn envelope_predecessors(
        &self,
        graph: GraphId,
        node: u32,
    ) -> impl Iterator<Item = u32> + '_ {
        let g = &self.graphs[graph];
        let row = if g.directed {
            &g.envelope_pred[node as usize]
        } else {
            &g.envelope_succ[node as usize]
        };
        row.iter()
    }

    pub(crate) fn kernel_out_degree(&self, graph: GraphId, node: u32) -> u32 {
        self.graphs[graph].kernel_out_degree[node as usize]
    }

    pub(crate) fn kernel_in_degree(&self, graph: GraphId, node: u32) -> u32 {
        self.graphs[graph].kernel_in_degree[node as usize]
    }

    pub(crate) fn envelope_out_degree(&self, graph: GraphId, node: u32) -> u32 {
        self.graphs[graph].envelope_succ[node as usize].len() as u32
    }

    pub(crate) fn envelope_in_degree(&self, graph: GraphId, node: u32) -> u32 {
        let g = &self.graphs[graph];
        if g.directed {
            g.envelope_pred[node as usize].len() as u32
        } else {
            g.envelope_succ[node as usize].len() as u32
        }
    }

    pub(crate) fn num_kernel_arcs(&self, graph: GraphId) -> usize {
        self.graphs[graph].num_kernel_arcs
    }

    pub(crate) fn num_envelope_arcs(&self, graph: GraphId) -> usize {
        self.graphs[graph].num_envelope_arcs
    }

    pub(crate) fn num_kernel_nodes(&self, graph: GraphId) -> usize {
        self.graphs[graph].num_kernel_nodes
    }

    pub(crate) fn num_envelope_nodes(&self, graph: GraphId) -> usize {
        self.graphs[graph].envelope_nodes.len()
    }

    /// A graph variable is assigned when the kernel and the envelope coincide.
    pub(crate) fn is_assigned(&self, graph: GraphId) -> bool {
        let g = &self.graphs[graph];
        g.num_kernel_arcs == g.num_envelope_arcs && g.num_kernel_nodes == g.envelope_nodes.len()
    }
}

// Reductions.
impl GraphAssignments {
    /// Makes a node mandatory. No-op if it already is; contradiction if the node is no longer
    /// possible.
    pub(crate) fn enforce_node(
        &mut self,
        graph: GraphId,
        node: u32,
        cause: Cause,
    ) -> PropagationStatusCP {
        let g = &mut self.graphs[graph];
        if g.kernel_nodes.contains(node as usize) {
            return Ok(());
        }
        if !g.envelope_nodes.contains(node) {
            return Err(Conflict::graph(graph, ConflictReason::Removal));
        }
        g.kernel_nodes.insert(node as usize);
        g.num_kernel_nodes += 1;
        self.trail.record(GraphTrailEntry::NodeEnforced { graph, node });
        self.events
            .push((graph, GraphUpdate::NodeEnforced(node), cause));
        Ok(())
    }

    /// Removes a node from the envelope together with its incident envelope arcs. No-op if the
    /// node is already gone; contradiction if it is mandatory.
    pub(crate) fn remove_node(
        &mut self,
        graph: GraphId,
        node: u32,
        cause: Cause,
    ) -> PropagationStatusCP {
        if !self.graphs[graph].envelope_nodes.contains(node) {
            return Ok(());
        }
        if self.graphs[graph].kernel_nodes.contains(node as usize) {
            return Err(Conflict::graph(graph, ConflictReason::Instantiation));
        }

        let incident: Vec<(u32, u32)> = {
            let g = &self.graphs[graph];
            let mut arcs: Vec<(u32, u32)> = g.envelope_succ[node as usize]
                .iter()
                .map(|to| (node, to))
                .collect();
            if g.directed {
                arcs.extend(
                    g.envelope_pred[node as usize]
                        .iter()
                        .filter(|&from| from != node)
                        .map(|from| (from, node)),
                );
            }
            arcs
        };
        for (from, to) in incident {
            self.remove_arc(graph, from, to, cause)?;
        }

        let g = &mut self.graphs[graph];
        g.envelope_nodes.remove(node);
        self.trail.record(GraphTrailEntry::NodeRemoved { graph, node });
        self.events
            .push((graph, GraphUpdate::NodeRemoved(node), cause));
        Ok(())
    }

    /// Makes an arc mandatory, enforcing its endpoints as a side effect. No-op if the arc is
    /// already mandatory; contradiction if it has been removed from the envelope.
    pub(crate) fn enforce_arc(
        &mut self,
        graph: GraphId,
        from: u32,
        to: u32,
        cause: Cause,
    ) -> PropagationStatusCP {
        let (from, to) = self.graphs[graph].canonical(from, to);
        if self.graphs[graph].kernel_succ[from as usize].contains(to as usize) {
            return Ok(());
        }
        if !self.graphs[graph].envelope_succ[from as usize].contains(to) {
            return Err(Conflict::graph(graph, ConflictReason::Removal));
        }

        self.enforce_node(graph, from, cause)?;
        if from != to {
            self.enforce_node(graph, to, cause)?;
        }

        let g = &mut self.graphs[graph];
        g.kernel_succ[from as usize].insert(to as usize);
        g.kernel_out_degree[from as usize] += 1;
        g.kernel_in_degree[to as usize] += 1;
        if g.directed {
            g.kernel_pred[to as usize].insert(from as usize);
        } else if from != to {
            g.kernel_succ[to as usize].insert(from as usize);
            g.kernel_out_degree[to as usize] += 1;
            g.kernel_in_degree[from as usize] += 1;
        }
        g.num_kernel_arcs += 1;
        self.trail
            .record(GraphTrailEntry::ArcEnforced { graph, from, to });
        self.events
            .push((graph, GraphUpdate::ArcEnforced(from, to), cause));
        Ok(())
    }

    /// Removes an arc from the envelope. No-op if it is already absent; contradiction if it is
    /// mandatory.
    pub(crate) fn remove_arc(
        &mut self,
        graph: GraphId,
        from: u32,
        to: u32,
        cause: Cause,
    ) -> PropagationStatusCP {
        let (from, to) = self.graphs[graph].canonical(from, to);
        if !self.graphs[graph].envelope_succ[from as usize].contains(to) {
            return Ok(());
        }
        if self.graphs[graph].kernel_succ[from as usize].contains(to as usize) {
            return Err(Conflict::graph(graph, ConflictReason::Instantiation));
        }

        let g = &mut self.graphs[graph];
        g.envelope_succ[from as usize].remove(to);
        if g.directed {
            g.envelope_pred[to as usize].remove(from);
        } else if from != to {
            g.envelope_succ[to as usize].remove(from);
        }
        g.num_envelope_arcs -= 1;
        self.trail
            .record(GraphTrailEntry::ArcRemoved { graph, from, to });
        self.events
            .push((graph, GraphUpdate::ArcRemoved(from, to), cause));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_edges(n: u32) -> Vec<(u32, u32)> {
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j));
            }
        }
        edges
    }

    #[test]
    fn enforcing_an_edge_is_symmetric_for_undirected_graphs() {
        let mut graphs = GraphAssignments::default();
        let g = graphs.grow(4, false, &complete_edges(4), true);

        graphs
            .enforce_arc(g, 2, 1, Cause::Search)
            .expect("edge is possible");

        assert!(graphs.is_arc_in_kernel(g, 1, 2));
        assert!(graphs.is_arc_in_kernel(g, 2, 1));
        assert_eq!(graphs.num_kernel_arcs(g), 1);
        assert_eq!(graphs.kernel_out_degree(g, 1), 1);
        assert_eq!(graphs.kernel_out_degree(g, 2), 1);
    }

    #[test]
    fn enforcing_a_removed_edge_fails_and_enforcing_twice_is_a_noop() {
        let mut graphs = GraphAssignments::default();
        let g = graphs.grow(3, false, &complete_edges(3), true);

        graphs
            .remove_arc(g, 0, 1, Cause::Search)
            .expect("not mandatory");
        assert!(graphs.enforce_arc(g, 0, 1, Cause::Search).is_err());

        graphs
            .enforce_arc(g, 0, 2, Cause::Search)
            .expect("edge is possible");
        let _ = graphs.drain_events();
        graphs
            .enforce_arc(g, 0, 2, Cause::Search)
            .expect("no-op on mandatory edge");
        assert!(graphs.drain_events().is_empty());
    }

    #[test]
    fn removing_a_mandatory_edge_fails() {
        let mut graphs = GraphAssignments::default();
        let g = graphs.grow(3, false, &complete_edges(3), true);

        graphs
            .enforce_arc(g, 0, 1, Cause::Search)
            .expect("edge is possible");
        assert!(graphs.remove_arc(g, 0, 1, Cause::Search).is_err());
    }

    #[test]
    fn kernel_and_envelope_round_trip_through_the_trail() {
        let mut graphs = GraphAssignments::default();
        let g = graphs.grow(4, true, &[(0, 1), (1, 2), (2, 3), (3, 0)], true);

        graphs.increase_decision_level();
        graphs
            .enforce_arc(g, 0, 1, Cause::Search)
            .expect("arc is possible");
        graphs
            .remove_arc(g, 2, 3, Cause::Search)
            .expect("arc is not mandatory");
        assert_eq!(graphs.num_kernel_arcs(g), 1);
        assert_eq!(graphs.num_envelope_arcs(g), 3);

        graphs.synchronise(0);
        assert_eq!(graphs.num_kernel_arcs(g), 0);
        assert_eq!(graphs.num_envelope_arcs(g), 4);
        assert!(graphs.is_arc_in_envelope(g, 2, 3));
        assert!(!graphs.is_arc_in_kernel(g, 0, 1));
        assert_eq!(graphs.kernel_out_degree(g, 0), 0);
    }

    #[test]
    fn removing_an_optional_node_drops_its_incident_arcs() {
        let mut graphs = GraphAssignments::default();
        let g = graphs.grow(3, true, &[(0, 1), (1, 2), (2, 0), (1, 1)], false);

        graphs
            .remove_node(g, 1, Cause::Search)
            .expect("node is optional");

        assert!(!graphs.is_node_in_envelope(g, 1));
        assert!(!graphs.is_arc_in_envelope(g, 0, 1));
        assert!(!graphs.is_arc_in_envelope(g, 1, 2));
        assert!(!graphs.is_arc_in_envelope(g, 1, 1));
        assert!(graphs.is_arc_in_envelope(g, 2, 0));
        assert_eq!(graphs.num_envelope_arcs(g), 1);
    }

    #[test]
    fn a_graph_is_assigned_when_kernel_meets_envelope() {
        let mut graphs = GraphAssignments::default();
        let g = graphs.grow(3, false, &complete_edges(3), true);

        assert!(!graphs.is_assigned(g));
        graphs.enforce_arc(g, 0, 1, Cause::Search).unwrap();
        graphs.enforce_arc(g, 1, 2, Cause::Search).unwrap();
        graphs.enforce_arc(g, 0, 2, Cause::Search).unwrap();
        assert!(graphs.is_assigned(g));
    }
}
