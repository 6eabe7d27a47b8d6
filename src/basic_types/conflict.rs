use crate::engine::propagation::PropagatorId;
use crate::variables::DomainId;
use crate::variables::GraphId;

/// The result of invoking a propagator or a domain mutator. Either the operation succeeded, or
/// the current partial assignment was found to be inconsistent.
///
/// A [`Conflict`] is an *expected* outcome: it is caught by the search loop, which backtracks.
/// It never crosses the public API.
pub(crate) type PropagationStatusCP = Result<(), Conflict>;

/// The agent responsible for a domain change. Used by the engine to avoid re-notifying the
/// propagator that produced a change, and recorded by the explanation sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cause {
    /// The change was made by the search loop (a decision) or through the model API.
    Search,
    /// The change was produced by the given propagator.
    Propagator(PropagatorId),
}

/// A handle to either kind of variable, used in conflicts and explanation records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariableRef {
    Integer(DomainId),
    Graph(GraphId),
}

/// Why a reduction was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictReason {
    /// The domain would become empty.
    EmptyDomain,
    /// A lower bound crossed the upper bound.
    LowerBound,
    /// An upper bound crossed the lower bound.
    UpperBound,
    /// An instantiation conflicted with an earlier one.
    Instantiation,
    /// A removal targeted the sole remaining value, or an enforced element.
    Removal,
    /// The inconsistency was detected by propagator-specific reasoning.
    Unknown,
}

/// An inconsistency raised during propagation, carrying the variable at fault (when there is a
/// single one) and a short reason tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub(crate) variable: Option<VariableRef>,
    pub(crate) reason: ConflictReason,
}

impl Conflict {
    pub(crate) fn integer(domain: DomainId, reason: ConflictReason) -> Conflict {
        Conflict {
            variable: Some(VariableRef::Integer(domain)),
            reason,
        }
    }

    pub(crate) fn graph(graph: GraphId, reason: ConflictReason) -> Conflict {
        Conflict {
            variable: Some(VariableRef::Graph(graph)),
            reason,
        }
    }

    /// The variable at fault, when the conflict concerns a single one.
    pub fn variable(&self) -> Option<VariableRef> {
        self.variable
    }

    pub fn reason(&self) -> ConflictReason {
        self.reason
    }
}
