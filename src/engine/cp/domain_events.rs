use enumset::EnumSet;
use enumset::EnumSetType;
use enumset::enum_set;

/// The events produced by reductions of an integer domain.
///
/// Every successful reduction emits the weakest event that accurately describes it; when the
/// change completes instantiation, [`IntEvent::Assign`] is added to the emitted set. A
/// subscription to the `LowerBound | UpperBound` mask therefore corresponds to watching bound
/// changes, including the ones implied by an assignment.
#[derive(Debug, EnumSetType)]
pub enum IntEvent {
    /// The domain was reduced to a single value.
    Assign,
    /// The lower bound increased.
    LowerBound,
    /// The upper bound decreased.
    UpperBound,
    /// A value was removed from the inside of the domain.
    Removal,
}

/// The events produced by reductions of a graph domain.
#[derive(Debug, EnumSetType)]
pub enum GraphEvent {
    /// An arc moved into the kernel.
    ArcEnforced,
    /// An arc was removed from the envelope.
    ArcRemoved,
    /// A node moved into the kernel.
    NodeEnforced,
    /// A node was removed from the envelope.
    NodeRemoved,
}

/// A graph domain change together with its payload, delivered to subscribed propagators.
///
/// For undirected graphs the endpoints are canonical: the smaller node id comes first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphUpdate {
    ArcEnforced(u32, u32),
    ArcRemoved(u32, u32),
    NodeEnforced(u32),
    NodeRemoved(u32),
}

impl GraphUpdate {
    pub fn kind(&self) -> GraphEvent {
        match self {
            GraphUpdate::ArcEnforced(_, _) => GraphEvent::ArcEnforced,
            GraphUpdate::ArcRemoved(_, _) => GraphEvent::ArcRemoved,
            GraphUpdate::NodeEnforced(_) => GraphEvent::NodeEnforced,
            GraphUpdate::NodeRemoved(_) => GraphEvent::NodeRemoved,
        }
    }
}

/// Commonly used integer event masks.
pub(crate) struct DomainEvents;

impl DomainEvents {
    /// Lower and upper bound tightening (but not other value removal).
    pub(crate) const BOUNDS: EnumSet<IntEvent> =
        enum_set!(IntEvent::LowerBound | IntEvent::UpperBound);
    /// Bound tightening, assignment, and single value removal.
    pub(crate) const ANY_INT: EnumSet<IntEvent> = enum_set!(
        IntEvent::Assign | IntEvent::LowerBound | IntEvent::UpperBound | IntEvent::Removal
    );
    /// Only the lower bound tightening.
    #[allow(unused)]
    pub(crate) const LOWER_BOUND: EnumSet<IntEvent> = enum_set!(IntEvent::LowerBound);
    /// Only the upper bound tightening.
    #[allow(unused)]
    pub(crate) const UPPER_BOUND: EnumSet<IntEvent> = enum_set!(IntEvent::UpperBound);
    /// Only assignment to a single value.
    #[allow(unused)]
    pub(crate) const ASSIGN: EnumSet<IntEvent> = enum_set!(IntEvent::Assign);
}

/// Commonly used graph event masks.
pub(crate) struct GraphEvents;

impl GraphEvents {
    pub(crate) const ANY_GRAPH: EnumSet<GraphEvent> = enum_set!(
        GraphEvent::ArcEnforced
            | GraphEvent::ArcRemoved
            | GraphEvent::NodeEnforced
            | GraphEvent::NodeRemoved
    );
    pub(crate) const ARC_ENFORCED: EnumSet<GraphEvent> = enum_set!(GraphEvent::ArcEnforced);
    #[allow(unused)]
    pub(crate) const ARCS: EnumSet<GraphEvent> =
        enum_set!(GraphEvent::ArcEnforced | GraphEvent::ArcRemoved);
}
