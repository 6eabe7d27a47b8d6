use enumset::EnumSet;

use crate::basic_types::Cause;
use crate::basic_types::PropagationStatusCP;
use crate::containers::StorageKey;
use crate::engine::cp::Assignments;
use crate::engine::cp::IntEvent;
use crate::engine::cp::Watchers;
use super::IntegerVariable;

/// The handle of an integer variable in the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DomainId {
    pub(crate) id: u32,
}

impl StorageKey for DomainId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        DomainId { id: index as u32 }
    }
}

impl std::fmt::Display for DomainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.id)
    }
}

impl IntegerVariable for DomainId {
    fn lower_bound(&self, assignments: &Assignments) -> i32 {
        assignments.get_lower_bound(*self)
    }

    fn upper_bound(&self, assignments: &Assignments) -> i32 {
        assignments.get_upper_bound(*self)
    }

    fn contains(&self, assignments: &Assignments, value: i32) -> bool {
        assignments.is_value_in_domain(*self, value)
    }

    fn has_enumerated_domain(&self, assignments: &Assignments) -> bool {
        assignments.has_enumerated_domain(*self)
    }

    fn next_value(&self, assignments: &Assignments, value: i32) -> Option<i32> {
        assignments.next_value(*self, value)
    }

    fn previous_value(&self, assignments: &Assignments, value: i32) -> Option<i32> {
        assignments.previous_value(*self, value)
    }

    fn set_lower_bound(
        &self,
        assignments: &mut Assignments,
        bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        assignments.tighten_lower_bound(*self, bound, cause)
    }

    fn set_upper_bound(
        &self,
        assignments: &mut Assignments,
        bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        assignments.tighten_upper_bound(*self, bound, cause)
    }

    fn remove_value(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        assignments.remove_value(*self, value, cause)
    }

    fn instantiate_to(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        assignments.make_assignment(*self, value, cause)
    }

    fn watch_all(&self, watchers: &mut Watchers<'_>, events: EnumSet<IntEvent>) {
        watchers.watch_all(*self, events);
    }

    fn value_in(&self, values: &[i32]) -> i32 {
        values[self.id as usize]
    }
}
