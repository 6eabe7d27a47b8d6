use enumset::EnumSet;

use crate::containers::KeyedVec;
use crate::engine::propagation::PropagatorVarId;
use crate::variables::DomainId;
use crate::variables::GraphId;
use super::domain_events::GraphEvent;
use super::domain_events::IntEvent;

/// Per-variable subscriber lists. Every propagator registers, per variable, the mask of
/// events it reacts to; on a domain change the engine walks the list and schedules the
/// subscribers whose mask intersects the emitted events.
#[derive(Debug, Default)]
pub(crate) struct WatchListCp {
    int_watchers: KeyedVec<DomainId, Vec<IntWatcher>>,
    graph_watchers: KeyedVec<GraphId, Vec<GraphWatcher>>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct IntWatcher {
    pub(crate) id: PropagatorVarId,
    pub(crate) events: EnumSet<IntEvent>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct GraphWatcher {
    pub(crate) id: PropagatorVarId,
    pub(crate) events: EnumSet<GraphEvent>,
}

impl WatchListCp {
    pub(crate) fn grow_integer(&mut self) {
        let _ = self.int_watchers.push(Vec::new());
    }

    pub(crate) fn grow_graph(&mut self) {
        let _ = self.graph_watchers.push(Vec::new());
    }

    pub(crate) fn watch_integer(
        &mut self,
        domain: DomainId,
        events: EnumSet<IntEvent>,
        id: PropagatorVarId,
    ) {
        self.int_watchers[domain].push(IntWatcher { id, events });
    }

    pub(crate) fn watch_graph(
        &mut self,
        graph: GraphId,
        events: EnumSet<GraphEvent>,
        id: PropagatorVarId,
    ) {
        self.graph_watchers[graph].push(GraphWatcher { id, events });
    }

    pub(crate) fn int_watchers(&self, domain: DomainId) -> &[IntWatcher] {
        &self.int_watchers[domain]
    }

    pub(crate) fn graph_watchers(&self, graph: GraphId) -> &[GraphWatcher] {
        &self.graph_watchers[graph]
    }
}

/// Used by a variable (or view) to register a propagator for notifications about its events.
/// Views subscribe the watcher to every underlying domain.
#[derive(Debug)]
pub struct Watchers<'a> {
    propagator_var: PropagatorVarId,
    watch_list: &'a mut WatchListCp,
}

impl<'a> Watchers<'a> {
    pub(crate) fn new(propagator_var: PropagatorVarId, watch_list: &'a mut WatchListCp) -> Self {
        Watchers {
            propagator_var,
            watch_list,
        }
    }

    pub(crate) fn watch_all(&mut self, domain: DomainId, events: EnumSet<IntEvent>) {
        self.watch_list
            .watch_integer(domain, events, self.propagator_var)
    }
}
