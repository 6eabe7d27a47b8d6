use enumset::EnumSet;

use crate::basic_types::Cause;
use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::Assignments;
use crate::engine::cp::IntEvent;
use crate::engine::cp::Watchers;
use super::IntegerVariable;

/// The bound-consistent view `y = a + b` over two integer variables.
///
/// The view is a pure projection: its bounds are `[a.lb + b.lb, a.ub + b.ub]`, computed from
/// the underlying domains on demand, so it can never drift from them and needs no trailed
/// state of its own. Tightening the view filters both underlying domains: `y >= v` becomes
/// `a >= v - b.ub` and `b >= v - a.ub`, and dually for the upper bound. Watching the view
/// watches both underlying domains, so a subscriber observes every bound move of the sum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SumView<A, B> {
    a: A,
    b: B,
}

impl<A: IntegerVariable, B: IntegerVariable> SumView<A, B> {
    pub fn new(a: A, b: B) -> Self {
        SumView { a, b }
    }

    fn filter_geq(
        &self,
        assignments: &mut Assignments,
        bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        let a_upper = self.a.upper_bound(assignments);
        let b_upper = self.b.upper_bound(assignments);
        self.a.set_lower_bound(assignments, bound - b_upper, cause)?;
        self.b.set_lower_bound(assignments, bound - a_upper, cause)
    }

    fn filter_leq(
        &self,
        assignments: &mut Assignments,
        bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        let a_lower = self.a.lower_bound(assignments);
        let b_lower = self.b.lower_bound(assignments);
        self.a.set_upper_bound(assignments, bound - b_lower, cause)?;
        self.b.set_upper_bound(assignments, bound - a_lower, cause)
    }
}

impl<A: IntegerVariable, B: IntegerVariable> IntegerVariable for SumView<A, B> {
    fn lower_bound(&self, assignments: &Assignments) -> i32 {
        self.a.lower_bound(assignments) + self.b.lower_bound(assignments)
    }

    fn upper_bound(&self, assignments: &Assignments) -> i32 {
        self.a.upper_bound(assignments) + self.b.upper_bound(assignments)
    }

    fn contains(&self, assignments: &Assignments, value: i32) -> bool {
        // Interval reasoning, as for any bounds-consistent sum.
        self.lower_bound(assignments) <= value && value <= self.upper_bound(assignments)
    }

    fn has_enumerated_domain(&self, _assignments: &Assignments) -> bool {
        false
    }

    fn next_value(&self, assignments: &Assignments, value: i32) -> Option<i32> {
        let lower_bound = self.lower_bound(assignments);
        let upper_bound = self.upper_bound(assignments);
        if value < lower_bound {
            Some(lower_bound)
        } else if value < upper_bound {
            Some(value + 1)
        } else {
            None
        }
    }

    fn previous_value(&self, assignments: &Assignments, value: i32) -> Option<i32> {
        let lower_bound = self.lower_bound(assignments);
        let upper_bound = self.upper_bound(assignments);
        if value > upper_bound {
            Some(upper_bound)
        } else if value > lower_bound {
            Some(value - 1)
        } else {
            None
        }
    }

    fn set_lower_bound(
        &self,
        assignments: &mut Assignments,
        bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        if bound > self.lower_bound(assignments) {
            self.filter_geq(assignments, bound, cause)?;
        }
        Ok(())
    }

    fn set_upper_bound(
        &self,
        assignments: &mut Assignments,
        bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        if bound < self.upper_bound(assignments) {
            self.filter_leq(assignments, bound, cause)?;
        }
        Ok(())
    }

    fn remove_value(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        // An interval view can only remove at its bounds; an interior removal is not
        // representable and a removal of the sole remaining value empties the view.
        let lower_bound = self.lower_bound(assignments);
        let upper_bound = self.upper_bound(assignments);
        if value == lower_bound {
            self.set_lower_bound(assignments, value + 1, cause)
        } else if value == upper_bound {
            self.set_upper_bound(assignments, value - 1, cause)
        } else {
            Ok(())
        }
    }

    fn instantiate_to(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        self.set_lower_bound(assignments, value, cause)?;
        self.set_upper_bound(assignments, value, cause)
    }

    fn watch_all(&self, watchers: &mut Watchers<'_>, events: EnumSet<IntEvent>) {
        // Either underlying bound can move either view bound, so watch both fully.
        let mut events = events;
        if events.contains(IntEvent::LowerBound) || events.contains(IntEvent::UpperBound) {
            events |= IntEvent::LowerBound | IntEvent::UpperBound;
        }
        self.a.watch_all(watchers, events);
        self.b.watch_all(watchers, events);
    }

    fn value_in(&self, values: &[i32]) -> i32 {
        self.a.value_in(values) + self.b.value_in(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_the_sum_of_the_underlying_bounds() {
        let mut assignments = Assignments::default();
        let a = assignments.grow(0, 5);
        let b = assignments.grow(1, 1);

        let sum = SumView::new(a, b);
        assert_eq!(sum.lower_bound(&assignments), 1);
        assert_eq!(sum.upper_bound(&assignments), 6);
    }

    #[test]
    fn view_bounds_follow_the_underlying_domain_across_backtracking() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 5);
        let one = assignments.grow(1, 1);
        let y = SumView::new(x, one);

        assignments.increase_decision_level();
        assignments
            .tighten_lower_bound(x, 3, Cause::Search)
            .expect("non-empty");
        assert_eq!(y.lower_bound(&assignments), 4);

        assignments.synchronise(0);
        assert_eq!(y.lower_bound(&assignments), 1);
    }

    #[test]
    fn tightening_the_view_filters_both_underlying_domains() {
        let mut assignments = Assignments::default();
        let a = assignments.grow(0, 4);
        let b = assignments.grow(0, 3);
        let sum = SumView::new(a, b);

        sum.set_lower_bound(&mut assignments, 6, Cause::Search)
            .expect("non-empty");
        assert_eq!(assignments.get_lower_bound(a), 3);
        assert_eq!(assignments.get_lower_bound(b), 2);

        sum.set_upper_bound(&mut assignments, 6, Cause::Search)
            .expect("non-empty");
        assert_eq!(assignments.get_upper_bound(a), 4);
        assert_eq!(assignments.get_upper_bound(b), 3);
    }

    #[test]
    fn emptying_the_view_is_a_conflict() {
        let mut assignments = Assignments::default();
        let a = assignments.grow(0, 2);
        let b = assignments.grow(0, 2);
        let sum = SumView::new(a, b);

        assert!(sum
            .set_lower_bound(&mut assignments, 5, Cause::Search)
            .is_err());
    }
}
