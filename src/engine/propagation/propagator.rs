use downcast_rs::Downcast;
use downcast_rs::impl_downcast;
use enumset::EnumSet;

use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::domain_events::GraphUpdate;
use crate::engine::cp::domain_events::IntEvent;
use crate::engine::explanation::RecordedChange;
use super::LocalId;
use super::contexts::PropagationContext;
use super::contexts::PropagationContextMut;
use super::contexts::PropagationContextWithTrailedValues;
use super::contexts::PropagatorInitialisationContext;

impl_downcast!(Propagator);

/// The contract implemented by every filtering algorithm.
///
/// A propagator subscribes to variables in [`Propagator::initialise_at_root`] and is then
/// driven by the engine: each event on a subscribed variable triggers [`Propagator::notify`]
/// (or [`Propagator::notify_graph`]), which may do cheap incremental bookkeeping and decides
/// whether the propagator is enqueued; once popped from the queue, [`Propagator::propagate`]
/// performs the filtering. Events received while the propagator is waiting in the queue are
/// coalesced: it runs once, however often it was notified.
///
/// On inconsistency a propagator returns a [`Conflict`](crate::Conflict); the search loop is
/// the sole catcher. A propagator that detects its constraint has become entailed can call
/// [`PropagationContextMut::set_passive`], which silences it until the trail pops past the
/// passivation point.
pub(crate) trait Propagator: Downcast {
    /// The name of the propagator; used for logging.
    fn name(&self) -> &str;

    /// The scheduling tier of this propagator. Cheaper propagators run first.
    fn priority(&self) -> Priority {
        Priority::Linear
    }

    /// Called once at post time. Registers subscriptions, allocates trailed state, and may
    /// report the constraint as trivially inconsistent. The engine runs an initial
    /// propagation to the fixed point right after.
    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP;

    /// Performs the filtering. Not required to reach its own fixed point in one call; the
    /// engine re-invokes it while its variables keep changing.
    fn propagate(&mut self, context: PropagationContextMut) -> PropagationStatusCP;

    /// Called for every integer event on a subscribed variable. Cheap bookkeeping only; the
    /// default schedules the propagator unconditionally, which is the right behaviour for
    /// non-incremental propagators.
    fn notify(
        &mut self,
        _context: PropagationContextWithTrailedValues,
        _local_id: LocalId,
        _events: EnumSet<IntEvent>,
    ) -> EnqueueDecision {
        EnqueueDecision::Enqueue
    }

    /// Called for every graph event on a subscribed graph variable, with the payload of the
    /// change.
    fn notify_graph(
        &mut self,
        _context: PropagationContextWithTrailedValues,
        _local_id: LocalId,
        _update: GraphUpdate,
    ) -> EnqueueDecision {
        EnqueueDecision::Enqueue
    }

    /// Called after the engine backtracks, so propagators can discard buffered deltas that
    /// refer to undone changes. Trailed state needs no attention, it is restored by the trail.
    fn synchronise(&mut self, _context: PropagationContext) {}

    /// Whether the constraint is certainly satisfied, certainly violated, or not yet decided
    /// under the current domains. Used for reification and debug checks; the default is
    /// [`Entailment::Undefined`], which is always sound.
    fn is_entailed(&self, _context: PropagationContext) -> Entailment {
        Entailment::Undefined
    }

    /// Explanation hook: the premises under which this propagator produced `change`. The
    /// default contributes nothing, which is sound; a learning sink needs propagators to
    /// override this.
    fn why(&self, _context: PropagationContext, _change: &RecordedChange) -> Vec<RecordedChange> {
        Vec::new()
    }
}

/// Indicator of what to do when a propagator is notified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EnqueueDecision {
    /// The propagator should be enqueued.
    Enqueue,
    /// The propagator should not be enqueued.
    Skip,
}

/// The truth status of a constraint under the current (partial) assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Entailment {
    Entailed,
    Violated,
    Undefined,
}

/// The scheduling tiers of the propagation queue, ordered from cheapest to most expensive.
/// The engine drains lower tiers first, so an expensive propagator always observes the fixed
/// point of everything cheaper that was scheduled at the same instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Priority {
    Unary = 0,
    Binary = 1,
    Ternary = 2,
    Linear = 3,
    Quadratic = 4,
    Cubic = 5,
    VerySlow = 6,
}

impl Priority {
    pub(crate) const NUM_TIERS: usize = 7;
}
