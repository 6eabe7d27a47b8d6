pub(crate) mod assignments;
pub(crate) mod domain_events;
pub(crate) mod graph;
pub(crate) mod propagator_queue;
#[cfg(test)]
pub(crate) mod test_solver;
pub(crate) mod trailed;
pub(crate) mod watch_list;

pub use assignments::Assignments;
pub use domain_events::GraphEvent;
pub use domain_events::GraphUpdate;
pub use domain_events::IntEvent;
pub(crate) use domain_events::DomainEvents;
pub use graph::GraphAssignments;
pub(crate) use propagator_queue::PropagatorQueue;
pub(crate) use trailed::ReversibleUnionFind;
pub(crate) use trailed::TrailedInt;
pub(crate) use trailed::TrailedValues;
pub(crate) use watch_list::WatchListCp;
pub use watch_list::Watchers;
