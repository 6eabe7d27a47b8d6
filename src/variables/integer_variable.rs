use enumset::EnumSet;

use crate::basic_types::Cause;
use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::Assignments;
use crate::engine::cp::IntEvent;
use crate::engine::cp::Watchers;

/// The behaviour of an integer variable: a concrete domain ([`DomainId`]) or a view over one
/// or more domains ([`AffineView`], [`SumView`]).
///
/// Views own no trailed state: their bounds are computed from their underlying domains on
/// demand, and their mutators translate into equivalent reductions of the underlying domains.
/// Subscribing to a view subscribes to all of its underlying domains.
///
/// [`DomainId`]: super::DomainId
/// [`AffineView`]: super::AffineView
/// [`SumView`]: super::SumView
pub trait IntegerVariable: Clone + std::fmt::Debug {
    /// Get the lower bound of the variable.
    fn lower_bound(&self, assignments: &Assignments) -> i32;

    /// Get the upper bound of the variable.
    fn upper_bound(&self, assignments: &Assignments) -> i32;

    /// Determine whether the value is in the domain of this variable.
    fn contains(&self, assignments: &Assignments, value: i32) -> bool;

    /// Whether the domain is enumerated (may contain holes) rather than a plain interval.
    fn has_enumerated_domain(&self, assignments: &Assignments) -> bool;

    /// The smallest domain value strictly greater than `value`, if any.
    fn next_value(&self, assignments: &Assignments, value: i32) -> Option<i32>;

    /// The largest domain value strictly smaller than `value`, if any.
    fn previous_value(&self, assignments: &Assignments, value: i32) -> Option<i32>;

    /// Tighten the lower bound to at least `bound`.
    fn set_lower_bound(
        &self,
        assignments: &mut Assignments,
        bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP;

    /// Tighten the upper bound to at most `bound`.
    fn set_upper_bound(
        &self,
        assignments: &mut Assignments,
        bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP;

    /// Remove a single value from the domain.
    fn remove_value(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> PropagationStatusCP;

    /// Fix the variable to `value`.
    fn instantiate_to(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> PropagationStatusCP;

    /// Register a watch for this variable on the given domain events.
    fn watch_all(&self, watchers: &mut Watchers<'_>, events: EnumSet<IntEvent>);

    /// The value of this variable given a full assignment snapshot, indexed by domain id.
    fn value_in(&self, values: &[i32]) -> i32;
}
