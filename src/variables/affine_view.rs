use enumset::EnumSet;

use crate::basic_types::Cause;
use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::Assignments;
use crate::engine::cp::IntEvent;
use crate::engine::cp::Watchers;
use super::IntegerVariable;

/// Models `y = scale * x + offset` by expressing the domain of `y` as a transformation of the
/// domain of `x`. Owns no state of its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AffineView<Inner> {
    inner: Inner,
    scale: i32,
    offset: i32,
}

enum Rounding {
    Up,
    Down,
}

impl<Inner> AffineView<Inner> {
    pub fn new(inner: Inner, scale: i32, offset: i32) -> Self {
        assert_ne!(scale, 0, "multiplication by zero is not invertible");
        AffineView {
            inner,
            scale,
            offset,
        }
    }

    fn map(&self, value: i32) -> i32 {
        self.scale * value + self.offset
    }

    /// Apply the inverse transformation of this view on a value, to go from the value in the
    /// domain of `self` to a value in the domain of `self.inner`.
    fn invert(&self, value: i32, rounding: Rounding) -> i32 {
        let inverted_translation = value - self.offset;
        match rounding {
            Rounding::Up => div_ceil(inverted_translation, self.scale),
            Rounding::Down => div_floor(inverted_translation, self.scale),
        }
    }
}

fn div_ceil(numerator: i32, denominator: i32) -> i32 {
    let quotient = numerator / denominator;
    if numerator % denominator != 0 && (numerator < 0) == (denominator < 0) {
        quotient + 1
    } else {
        quotient
    }
}

fn div_floor(numerator: i32, denominator: i32) -> i32 {
    let quotient = numerator / denominator;
    if numerator % denominator != 0 && (numerator < 0) != (denominator < 0) {
        quotient - 1
    } else {
        quotient
    }
}

impl<View: IntegerVariable> IntegerVariable for AffineView<View> {
    fn lower_bound(&self, assignments: &Assignments) -> i32 {
        if self.scale < 0 {
            self.map(self.inner.upper_bound(assignments))
        } else {
            self.map(self.inner.lower_bound(assignments))
        }
    }

    fn upper_bound(&self, assignments: &Assignments) -> i32 {
        if self.scale < 0 {
            self.map(self.inner.lower_bound(assignments))
        } else {
            self.map(self.inner.upper_bound(assignments))
        }
    }

    fn contains(&self, assignments: &Assignments, value: i32) -> bool {
        if (value - self.offset) % self.scale == 0 {
            let inverted = self.invert(value, Rounding::Up);
            self.inner.contains(assignments, inverted)
        } else {
            false
        }
    }

    fn has_enumerated_domain(&self, assignments: &Assignments) -> bool {
        self.inner.has_enumerated_domain(assignments)
    }

    fn next_value(&self, assignments: &Assignments, value: i32) -> Option<i32> {
        // Walk the underlying domain in the direction that increases the view.
        if self.scale > 0 {
            self.inner
                .next_value(assignments, self.invert(value, Rounding::Down))
                .map(|v| self.map(v))
        } else {
            self.inner
                .previous_value(assignments, self.invert(value, Rounding::Up))
                .map(|v| self.map(v))
        }
    }

    fn previous_value(&self, assignments: &Assignments, value: i32) -> Option<i32> {
        if self.scale > 0 {
            self.inner
                .previous_value(assignments, self.invert(value, Rounding::Up))
                .map(|v| self.map(v))
        } else {
            self.inner
                .next_value(assignments, self.invert(value, Rounding::Down))
                .map(|v| self.map(v))
        }
    }

    fn set_lower_bound(
        &self,
        assignments: &mut Assignments,
        bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        if self.scale >= 0 {
            self.inner
                .set_lower_bound(assignments, self.invert(bound, Rounding::Up), cause)
        } else {
            self.inner
                .set_upper_bound(assignments, self.invert(bound, Rounding::Down), cause)
        }
    }

    fn set_upper_bound(
        &self,
        assignments: &mut Assignments,
        bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        if self.scale >= 0 {
            self.inner
                .set_upper_bound(assignments, self.invert(bound, Rounding::Down), cause)
        } else {
            self.inner
                .set_lower_bound(assignments, self.invert(bound, Rounding::Up), cause)
        }
    }

    fn remove_value(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        if (value - self.offset) % self.scale == 0 {
            self.inner
                .remove_value(assignments, self.invert(value, Rounding::Up), cause)
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
        // A negative scale swaps which underlying bound moves which view bound.
        let events = if self.scale < 0 {
            let mut flipped = events;
            flipped.remove(IntEvent::LowerBound);
            flipped.remove(IntEvent::UpperBound);
            if events.contains(IntEvent::LowerBound) {
                flipped.insert(IntEvent::UpperBound);
            }
            if events.contains(IntEvent::UpperBound) {
                flipped.insert(IntEvent::LowerBound);
            }
            flipped
        } else {
            events
        };
        self.inner.watch_all(watchers, events);
    }

    fn value_in(&self, values: &[i32]) -> i32 {
        self.map(self.inner.value_in(values))
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::cp::Assignments;
    use super::*;

    #[test]
    fn bounds_are_scaled_and_shifted() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(2, 5);

        let view = AffineView::new(x, 3, 1);
        assert_eq!(view.lower_bound(&assignments), 7);
        assert_eq!(view.upper_bound(&assignments), 16);

        let negated = AffineView::new(x, -1, 0);
        assert_eq!(negated.lower_bound(&assignments), -5);
        assert_eq!(negated.upper_bound(&assignments), -2);
    }

    #[test]
    fn tightening_the_view_tightens_the_underlying_domain() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 10);

        let view = AffineView::new(x, 2, 0);
        view.set_lower_bound(&mut assignments, 5, Cause::Search)
            .expect("non-empty");

        // 5 on the view rounds up to 3 on x.
        assert_eq!(assignments.get_lower_bound(x), 3);
        assert_eq!(view.lower_bound(&assignments), 6);
    }

    #[test]
    fn contains_respects_divisibility() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 10);
        let view = AffineView::new(x, 2, 1);

        assert!(view.contains(&assignments, 5));
        assert!(!view.contains(&assignments, 4));
    }
}
