use crate::basic_types::Conflict;
use crate::basic_types::ConflictReason;
use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::domain_events::GraphEvents;
use crate::engine::cp::domain_events::GraphUpdate;
use crate::engine::propagation::EnqueueDecision;
use crate::engine::propagation::Entailment;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::PropagationContextWithTrailedValues;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::ReadDomains;
use crate::variables::GraphId;

/// Which incidence of a node the degree bounds apply to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DegreeOrientation {
    /// Undirected neighbours.
    Neighbours,
    /// Outgoing arcs of a directed graph.
    Successors,
    /// Incoming arcs of a directed graph.
    Predecessors,
}

/// Enforces `degree(i) ∈ [min_degree[i], max_degree[i]]` for every node in the final graph.
///
/// Filtering: once a node's mandatory degree reaches its maximum, every remaining possible
/// incident arc is removed; once its possible degree drops to its minimum, every remaining
/// possible incident arc is promoted to mandatory. A mandatory degree above the maximum or a
/// possible degree below the minimum is a contradiction. Optional nodes whose possible degree
/// is too small are removed instead.
///
/// Incremental: each arc event re-examines only the touched endpoints.
#[derive(Clone, Debug)]
pub(crate) struct NodeDegreePropagator {
    graph: GraphId,
    orientation: DegreeOrientation,
    min_degree: Vec<u32>,
    max_degree: Vec<u32>,
    /// Nodes touched since the last run.
    pending: Vec<u32>,
    scan_all: bool,
}

impl NodeDegreePropagator {
    pub(crate) fn with_bounds(
        graph: GraphId,
        orientation: DegreeOrientation,
        min_degree: Vec<u32>,
        max_degree: Vec<u32>,
    ) -> Self {
        NodeDegreePropagator {
            graph,
            orientation,
            min_degree,
            max_degree,
            pending: Vec::new(),
            scan_all: true,
        }
    }

    pub(crate) fn uniform(
        graph: GraphId,
        orientation: DegreeOrientation,
        num_nodes: usize,
        min_degree: u32,
        max_degree: u32,
    ) -> Self {
        Self::with_bounds(
            graph,
            orientation,
            vec![min_degree; num_nodes],
            vec![max_degree; num_nodes],
        )
    }

    fn kernel_degree(&self, context: &impl ReadDomains, node: u32) -> u32 {
        match self.orientation {
            DegreeOrientation::Neighbours | DegreeOrientation::Successors => {
                context.kernel_out_degree(self.graph, node)
            }
            DegreeOrientation::Predecessors => context.kernel_in_degree(self.graph, node),
        }
    }

    fn envelope_degree(&self, context: &impl ReadDomains, node: u32) -> u32 {
        match self.orientation {
            DegreeOrientation::Neighbours | DegreeOrientation::Successors => {
                context.envelope_out_degree(self.graph, node)
            }
            DegreeOrientation::Predecessors => context.envelope_in_degree(self.graph, node),
        }
    }

    /// The possible incident arcs of `node`, as (from, to) pairs for this orientation.
    fn incident_envelope_arcs(
        &self,
        context: &impl ReadDomains,
        node: u32,
    ) -> Vec<(u32, u32)> {
        match self.orientation {
            DegreeOrientation::Neighbours | DegreeOrientation::Successors => context
                .envelope_successors(self.graph, node)
                .map(|to| (node, to))
                .collect(),
            DegreeOrientation::Predecessors => context
                .envelope_predecessors(self.graph, node)
                .map(|from| (from, node))
                .collect(),
        }
    }

    /// The endpoint of the arc that this instance must revisit after the arc changed, other
    /// than `node` itself. Directed orientations track a single endpoint per arc, so only the
    /// undirected variant fans out.
    fn other_affected_endpoint(&self, node: u32, from: u32, to: u32) -> Option<u32> {
        match self.orientation {
            DegreeOrientation::Neighbours => {
                let other = if from == node { to } else { from };
                (other != node).then_some(other)
            }
            DegreeOrientation::Successors | DegreeOrientation::Predecessors => None,
        }
    }

    fn check_node(
        &self,
        context: &mut PropagationContextMut,
        node: u32,
        worklist: &mut Vec<u32>,
    ) -> PropagationStatusCP {
        if !context.is_node_in_envelope(self.graph, node) {
            return Ok(());
        }

        let kernel_degree = self.kernel_degree(context, node);
        let envelope_degree = self.envelope_degree(context, node);
        let min_degree = self.min_degree[node as usize];
        let max_degree = self.max_degree[node as usize];

        if !context.is_node_in_kernel(self.graph, node) {
            if envelope_degree < min_degree {
                context.remove_node(self.graph, node)?;
            }
            return Ok(());
        }

        if kernel_degree > max_degree || envelope_degree < min_degree {
            return Err(Conflict::graph(self.graph, ConflictReason::Unknown));
        }

        if kernel_degree == max_degree && envelope_degree > kernel_degree {
            for (from, to) in self.incident_envelope_arcs(context, node) {
                if !context.is_arc_in_kernel(self.graph, from, to) {
                    context.remove_arc(self.graph, from, to)?;
                    if let Some(other) = self.other_affected_endpoint(node, from, to) {
                        worklist.push(other);
                    }
                }
            }
        } else if envelope_degree == min_degree && kernel_degree < envelope_degree {
            for (from, to) in self.incident_envelope_arcs(context, node) {
                if !context.is_arc_in_kernel(self.graph, from, to) {
                    context.enforce_arc(self.graph, from, to)?;
                    if let Some(other) = self.other_affected_endpoint(node, from, to) {
                        worklist.push(other);
                    }
                }
            }
        }

        Ok(())
    }
}

impl Propagator for NodeDegreePropagator {
    fn name(&self) -> &str {
        match self.orientation {
            DegreeOrientation::Neighbours => "NodeDegree",
            DegreeOrientation::Successors => "NodeDegreeOut",
            DegreeOrientation::Predecessors => "NodeDegreeIn",
        }
    }

    fn priority(&self) -> Priority {
        Priority::Binary
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP {
        let num_nodes = context.num_nodes(self.graph);
        assert_eq!(self.min_degree.len(), num_nodes);
        assert_eq!(self.max_degree.len(), num_nodes);

        context.register_graph(self.graph, GraphEvents::ANY_GRAPH, LocalId::from(0));
        self.scan_all = true;
        Ok(())
    }

    fn notify_graph(
        &mut self,
        _context: PropagationContextWithTrailedValues,
        _local_id: LocalId,
        update: GraphUpdate,
    ) -> EnqueueDecision {
        match update {
            GraphUpdate::ArcEnforced(from, to) | GraphUpdate::ArcRemoved(from, to) => {
                self.pending.push(from);
                if from != to {
                    self.pending.push(to);
                }
            }
            GraphUpdate::NodeEnforced(node) | GraphUpdate::NodeRemoved(node) => {
                self.pending.push(node);
            }
        }
        EnqueueDecision::Enqueue
    }

    fn synchronise(&mut self, _context: PropagationContext) {
        self.pending.clear();
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let mut worklist = if self.scan_all {
            self.scan_all = false;
            self.pending.clear();
            (0..context.num_nodes(self.graph) as u32).collect()
        } else {
            std::mem::take(&mut self.pending)
        };

        while let Some(node) = worklist.pop() {
            self.check_node(&mut context, node, &mut worklist)?;
        }
        Ok(())
    }

    fn is_entailed(&self, context: PropagationContext) -> Entailment {
        if !context.is_graph_assigned(self.graph) {
            return Entailment::Undefined;
        }
        for node in 0..context.num_nodes(self.graph) as u32 {
            if !context.is_node_in_kernel(self.graph, node) {
                continue;
            }
            let degree = self.kernel_degree(&context, node);
            if degree < self.min_degree[node as usize] || degree > self.max_degree[node as usize] {
                return Entailment::Violated;
            }
        }
        Entailment::Entailed
    }
}
