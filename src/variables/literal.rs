use enumset::EnumSet;

use crate::basic_types::Cause;
use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::Assignments;
use crate::engine::cp::IntEvent;
use crate::engine::cp::Watchers;
use super::DomainId;
use super::IntegerVariable;

/// A boolean variable: an integer variable restricted to `{0, 1}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    domain: DomainId,
}

impl Literal {
    pub(crate) fn new(domain: DomainId) -> Literal {
        Literal { domain }
    }

    pub fn domain_id(&self) -> DomainId {
        self.domain
    }

    pub fn is_true(&self, assignments: &Assignments) -> bool {
        self.domain.lower_bound(assignments) == 1
    }

    pub fn is_false(&self, assignments: &Assignments) -> bool {
        self.domain.upper_bound(assignments) == 0
    }
}

impl IntegerVariable for Literal {
    fn lower_bound(&self, assignments: &Assignments) -> i32 {
        self.domain.lower_bound(assignments)
    }

    fn upper_bound(&self, assignments: &Assignments) -> i32 {
        self.domain.upper_bound(assignments)
    }

    fn contains(&self, assignments: &Assignments, value: i32) -> bool {
        self.domain.contains(assignments, value)
    }

    fn has_enumerated_domain(&self, assignments: &Assignments) -> bool {
        self.domain.has_enumerated_domain(assignments)
    }

    fn next_value(&self, assignments: &Assignments, value: i32) -> Option<i32> {
        self.domain.next_value(assignments, value)
    }

    fn previous_value(&self, assignments: &Assignments, value: i32) -> Option<i32> {
        self.domain.previous_value(assignments, value)
    }

    fn set_lower_bound(
        &self,
        assignments: &mut Assignments,
        bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        self.domain.set_lower_bound(assignments, bound, cause)
    }

    fn set_upper_bound(
        &self,
        assignments: &mut Assignments,
        bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        self.domain.set_upper_bound(assignments, bound, cause)
    }

    fn remove_value(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        self.domain.remove_value(assignments, value, cause)
    }

    fn instantiate_to(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        self.domain.instantiate_to(assignments, value, cause)
    }

    fn watch_all(&self, watchers: &mut Watchers<'_>, events: EnumSet<IntEvent>) {
        self.domain.watch_all(watchers, events)
    }

    fn value_in(&self, values: &[i32]) -> i32 {
        self.domain.value_in(values)
    }
}
