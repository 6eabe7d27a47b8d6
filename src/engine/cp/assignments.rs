use enumset::EnumSet;
use enumset::enum_set;

use crate::basic_types::Cause;
use crate::basic_types::Conflict;
use crate::basic_types::ConflictReason;
use crate::basic_types::PropagationStatusCP;
use crate::basic_types::Trail;
use crate::containers::KeyedVec;
use crate::marrow_assert_moderate;
use crate::marrow_assert_simple;
use crate::variables::DomainId;
use super::domain_events::IntEvent;

/// The integer domain store: the domains of all integer variables, the trail that makes them
/// reversible, and the buffer of pending events.
///
/// Domains only ever shrink within a decision level; every successful reduction pushes exactly
/// one trail entry and buffers exactly one event record, which the engine later delivers to
/// the subscribed propagators.
#[derive(Clone, Debug, Default)]
pub struct Assignments {
    trail: Trail<IntTrailEntry>,
    domains: KeyedVec<DomainId, IntegerDomain>,
    events: Vec<(DomainId, EnumSet<IntEvent>, Cause)>,
}

#[derive(Clone, Copy, Debug)]
struct IntTrailEntry {
    domain: DomainId,
    old_lower_bound: i32,
    old_upper_bound: i32,
    /// `Some` when the entry logs a hole punched into an enumerated domain.
    removed_value: Option<i32>,
}

#[derive(Clone, Debug)]
struct IntegerDomain {
    lower_bound: i32,
    upper_bound: i32,
    initial_lower_bound: i32,
    /// Explicit value presence for enumerated domains, indexed by `value - initial_lower_bound`.
    /// Bounded domains carry no per-value state.
    is_value_in_domain: Option<Vec<bool>>,
}

impl IntegerDomain {
    fn value_present(&self, value: i32) -> bool {
        if value < self.lower_bound || value > self.upper_bound {
            return false;
        }
        match &self.is_value_in_domain {
            Some(present) => present[(value - self.initial_lower_bound) as usize],
            None => true,
        }
    }
}

impl Assignments {
    pub(crate) fn increase_decision_level(&mut self) {
        self.trail.open_level()
    }

    pub(crate) fn get_decision_level(&self) -> usize {
        self.trail.current_level()
    }

    pub(crate) fn domain_ids(&self) -> impl Iterator<Item = DomainId> {
        self.domains.keys()
    }

    /// Registers the domain of a new integer variable with a bounded (interval) domain.
    ///
    /// Note that this is an internal method; variables are created through the solver, which
    /// also grows the watch lists.
    pub(crate) fn grow(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        marrow_assert_simple!(
            self.get_decision_level() == 0,
            "variables can only be created at the root"
        );
        marrow_assert_simple!(lower_bound <= upper_bound);

        self.domains.push(IntegerDomain {
            lower_bound,
            upper_bound,
            initial_lower_bound: lower_bound,
            is_value_in_domain: None,
        })
    }

    /// Registers the domain of a new integer variable with an enumerated domain holding exactly
    /// the given values.
    pub(crate) fn grow_sparse(&mut self, mut values: Vec<i32>) -> DomainId {
        marrow_assert_simple!(
            self.get_decision_level() == 0,
            "variables can only be created at the root"
        );
        assert!(
            !values.is_empty(),
            "cannot create a variable with an empty domain"
        );

        values.sort_unstable();
        values.dedup();

        let lower_bound = values[0];
        let upper_bound = values[values.len() - 1];

        let mut is_value_in_domain = vec![false; (upper_bound - lower_bound + 1) as usize];
        for value in values {
            is_value_in_domain[(value - lower_bound) as usize] = true;
        }

        self.domains.push(IntegerDomain {
            lower_bound,
            upper_bound,
            initial_lower_bound: lower_bound,
            is_value_in_domain: Some(is_value_in_domain),
        })
    }

    pub(crate) fn drain_events(&mut self) -> Vec<(DomainId, EnumSet<IntEvent>, Cause)> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn discard_events(&mut self) {
        self.events.clear();
    }

    /// Undoes every reduction made since the given decision level was opened.
    pub(crate) fn synchronise(&mut self, new_decision_level: usize) {
        let domains = &mut self.domains;
        self.trail.close_levels_down_to(new_decision_level, |entry| {
            let domain = &mut domains[entry.domain];
            domain.lower_bound = entry.old_lower_bound;
            domain.upper_bound = entry.old_upper_bound;
            if let Some(value) = entry.removed_value {
                let offset = (value - domain.initial_lower_bound) as usize;
                domain
                    .is_value_in_domain
                    .as_mut()
                    .expect("hole entries only exist for enumerated domains")[offset] = true;
            }
        });
    }
}

// Queries.
impl Assignments {
    pub(crate) fn get_lower_bound(&self, domain: DomainId) -> i32 {
        self.domains[domain].lower_bound
    }

    pub(crate) fn get_upper_bound(&self, domain: DomainId) -> i32 {
        self.domains[domain].upper_bound
    }

    pub(crate) fn is_value_in_domain(&self, domain: DomainId, value: i32) -> bool {
        self.domains[domain].value_present(value)
    }

    pub(crate) fn is_assigned(&self, domain: DomainId) -> bool {
        let d = &self.domains[domain];
        d.lower_bound == d.upper_bound
    }

    pub(crate) fn has_enumerated_domain(&self, domain: DomainId) -> bool {
        self.domains[domain].is_value_in_domain.is_some()
    }

    /// The number of values in the domain. For enumerated domains this traverses the bound
    /// range to skip holes.
    pub(crate) fn domain_size(&self, domain: DomainId) -> u64 {
        let d = &self.domains[domain];
        match &d.is_value_in_domain {
            None => (d.upper_bound as i64 - d.lower_bound as i64 + 1) as u64,
            Some(_) => (d.lower_bound..=d.upper_bound)
                .filter(|&value| d.value_present(value))
                .count() as u64,
        }
    }

    /// The smallest domain value strictly greater than `value`, if any.
    pub(crate) fn next_value(&self, domain: DomainId, value: i32) -> Option<i32> {
        let d = &self.domains[domain];
        if value < d.lower_bound {
            return Some(d.lower_bound);
        }
        let mut candidate = value.checked_add(1)?;
        while candidate <= d.upper_bound {
            if d.value_present(candidate) {
                return Some(candidate);
            }
            candidate += 1;
        }
        None
    }

    /// The largest domain value strictly smaller than `value`, if any.
    pub(crate) fn previous_value(&self, domain: DomainId, value: i32) -> Option<i32> {
        let d = &self.domains[domain];
        if value > d.upper_bound {
            return Some(d.upper_bound);
        }
        let mut candidate = value.checked_sub(1)?;
        while candidate >= d.lower_bound {
            if d.value_present(candidate) {
                return Some(candidate);
            }
            candidate -= 1;
        }
        None
    }
}

// Reductions.
impl Assignments {
    pub(crate) fn tighten_lower_bound(
        &mut self,
        domain: DomainId,
        new_lower_bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        let d = &self.domains[domain];
        if new_lower_bound <= d.lower_bound {
            return Ok(());
        }
        if new_lower_bound > d.upper_bound {
            return Err(Conflict::integer(domain, ConflictReason::LowerBound));
        }

        // For enumerated domains the new bound lands on the next value actually present. The
        // upper bound is present by construction, so the walk terminates within the range.
        let mut actual = new_lower_bound;
        while !self.domains[domain].value_present(actual) {
            actual += 1;
        }

        let d = &mut self.domains[domain];
        self.trail.record(IntTrailEntry {
            domain,
            old_lower_bound: d.lower_bound,
            old_upper_bound: d.upper_bound,
            removed_value: None,
        });
        d.lower_bound = actual;

        let mut events = enum_set!(IntEvent::LowerBound);
        if d.lower_bound == d.upper_bound {
            events |= IntEvent::Assign;
        }
        self.events.push((domain, events, cause));
        Ok(())
    }

    pub(crate) fn tighten_upper_bound(
        &mut self,
        domain: DomainId,
        new_upper_bound: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        let d = &self.domains[domain];
        if new_upper_bound >= d.upper_bound {
            return Ok(());
        }
        if new_upper_bound < d.lower_bound {
            return Err(Conflict::integer(domain, ConflictReason::UpperBound));
        }

        let mut actual = new_upper_bound;
        while !self.domains[domain].value_present(actual) {
            actual -= 1;
        }

        let d = &mut self.domains[domain];
        self.trail.record(IntTrailEntry {
            domain,
            old_lower_bound: d.lower_bound,
            old_upper_bound: d.upper_bound,
            removed_value: None,
        });
        d.upper_bound = actual;

        let mut events = enum_set!(IntEvent::UpperBound);
        if d.lower_bound == d.upper_bound {
            events |= IntEvent::Assign;
        }
        self.events.push((domain, events, cause));
        Ok(())
    }

    /// Removes a single value. Removing the sole remaining value is a contradiction. At a
    /// bound, the removal becomes a bound tightening; inside a bounded domain the operation is
    /// not representable and is ignored (this indicates a modelling mistake, caught in debug
    /// builds).
    pub(crate) fn remove_value(
        &mut self,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        let d = &self.domains[domain];
        if !d.value_present(value) {
            return Ok(());
        }
        if d.lower_bound == d.upper_bound {
            // The sole remaining value.
            return Err(Conflict::integer(domain, ConflictReason::Removal));
        }
        if value == d.lower_bound {
            return self.tighten_lower_bound(domain, value + 1, cause);
        }
        if value == d.upper_bound {
            return self.tighten_upper_bound(domain, value - 1, cause);
        }

        if self.domains[domain].is_value_in_domain.is_none() {
            marrow_assert_moderate!(
                false,
                "interior removal on a bounded domain is only legal at a bound"
            );
            return Ok(());
        }

        let d = &mut self.domains[domain];
        self.trail.record(IntTrailEntry {
            domain,
            old_lower_bound: d.lower_bound,
            old_upper_bound: d.upper_bound,
            removed_value: Some(value),
        });
        let offset = (value - d.initial_lower_bound) as usize;
        d.is_value_in_domain.as_mut().unwrap()[offset] = false;

        self.events
            .push((domain, enum_set!(IntEvent::Removal), cause));
        Ok(())
    }

    /// Removes the interval `[from, to]` (inclusive) from the domain.
    pub(crate) fn remove_interval(
        &mut self,
        domain: DomainId,
        from: i32,
        to: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        if from > to {
            return Ok(());
        }
        let d = &self.domains[domain];
        if from <= d.lower_bound && to >= d.upper_bound {
            return Err(Conflict::integer(domain, ConflictReason::EmptyDomain));
        }
        if from <= d.lower_bound {
            return self.tighten_lower_bound(domain, to + 1, cause);
        }
        if to >= d.upper_bound {
            return self.tighten_upper_bound(domain, from - 1, cause);
        }
        for value in from..=to {
            self.remove_value(domain, value, cause)?;
        }
        Ok(())
    }

    /// Fixes the domain to a single value. Emits one event covering the bound changes and the
    /// assignment, and pushes one trail entry.
    pub(crate) fn make_assignment(
        &mut self,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> PropagationStatusCP {
        let d = &self.domains[domain];
        if !d.value_present(value) {
            return Err(Conflict::integer(domain, ConflictReason::Instantiation));
        }
        if d.lower_bound == d.upper_bound {
            // Already assigned to this value, otherwise value_present would have failed.
            return Ok(());
        }

        let mut events = enum_set!(IntEvent::Assign);
        if value > d.lower_bound {
            events |= IntEvent::LowerBound;
        }
        if value < d.upper_bound {
            events |= IntEvent::UpperBound;
        }

        let d = &mut self.domains[domain];
        self.trail.record(IntTrailEntry {
            domain,
            old_lower_bound: d.lower_bound,
            old_upper_bound: d.upper_bound,
            removed_value: None,
        });
        d.lower_bound = value;
        d.upper_bound = value;

        self.events.push((domain, events, cause));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_round_trip_through_the_trail() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 10);

        assignments.increase_decision_level();
        assignments
            .tighten_lower_bound(x, 4, Cause::Search)
            .expect("non-empty");
        assignments
            .tighten_upper_bound(x, 7, Cause::Search)
            .expect("non-empty");
        assert_eq!(assignments.get_lower_bound(x), 4);
        assert_eq!(assignments.get_upper_bound(x), 7);

        assignments.synchronise(0);
        assert_eq!(assignments.get_lower_bound(x), 0);
        assert_eq!(assignments.get_upper_bound(x), 10);
    }

    #[test]
    fn crossing_the_opposite_bound_is_a_conflict() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 5);

        assert!(assignments.tighten_lower_bound(x, 6, Cause::Search).is_err());
        assert!(assignments
            .tighten_upper_bound(x, -1, Cause::Search)
            .is_err());
    }

    #[test]
    fn removing_the_sole_value_is_a_conflict() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(3, 3);

        assert!(assignments.remove_value(x, 3, Cause::Search).is_err());
    }

    #[test]
    fn enumerated_bounds_skip_holes() {
        let mut assignments = Assignments::default();
        let x = assignments.grow_sparse(vec![1, 3, 6, 9]);

        assert!(assignments.has_enumerated_domain(x));
        assert_eq!(assignments.domain_size(x), 4);

        assignments
            .tighten_lower_bound(x, 2, Cause::Search)
            .expect("non-empty");
        assert_eq!(assignments.get_lower_bound(x), 3);

        assignments
            .tighten_upper_bound(x, 8, Cause::Search)
            .expect("non-empty");
        assert_eq!(assignments.get_upper_bound(x), 6);
    }

    #[test]
    fn hole_removal_round_trips() {
        let mut assignments = Assignments::default();
        let x = assignments.grow_sparse(vec![1, 2, 3, 4]);

        assignments.increase_decision_level();
        assignments
            .remove_value(x, 3, Cause::Search)
            .expect("non-empty");
        assert!(!assignments.is_value_in_domain(x, 3));
        assert_eq!(assignments.next_value(x, 2), Some(4));

        assignments.synchronise(0);
        assert!(assignments.is_value_in_domain(x, 3));
        assert_eq!(assignments.next_value(x, 2), Some(3));
    }

    #[test]
    fn instantiation_emits_a_single_event_with_the_assign_bit() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 10);
        let _ = assignments.drain_events();

        assignments
            .make_assignment(x, 4, Cause::Search)
            .expect("4 is in the domain");

        let events = assignments.drain_events();
        assert_eq!(events.len(), 1);
        let (domain, set, _) = events[0];
        assert_eq!(domain, x);
        assert!(set.contains(IntEvent::Assign));
        assert!(set.contains(IntEvent::LowerBound));
        assert!(set.contains(IntEvent::UpperBound));
    }

    #[test]
    fn tightening_to_the_upper_bound_upgrades_to_assign() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 5);
        let _ = assignments.drain_events();

        assignments
            .tighten_lower_bound(x, 5, Cause::Search)
            .expect("non-empty");

        let events = assignments.drain_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].1.contains(IntEvent::Assign));
        assert!(events[0].1.contains(IntEvent::LowerBound));
        assert!(!events[0].1.contains(IntEvent::UpperBound));
    }

    #[test]
    fn remove_interval_splits_into_bound_updates() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 10);

        assignments
            .remove_interval(x, 0, 3, Cause::Search)
            .expect("non-empty");
        assert_eq!(assignments.get_lower_bound(x), 4);

        assignments
            .remove_interval(x, 8, 10, Cause::Search)
            .expect("non-empty");
        assert_eq!(assignments.get_upper_bound(x), 7);

        assert!(assignments
            .remove_interval(x, 4, 7, Cause::Search)
            .is_err());
    }
}
