//! A [`TerminationCondition`] is a condition which is polled by the solver during the search
//! process. It indicates when the solver should stop, even if no definitive conclusion has
//! been reached. The most common example is [`TimeBudget`], which gives the solver a certain
//! time budget to complete its search.

mod combinator;
mod conflict_budget;
mod indefinite;
mod time_budget;

pub use combinator::Combinator;
pub use conflict_budget::ConflictBudget;
pub use indefinite::Indefinite;
pub use time_budget::TimeBudget;

/// The central trait that defines a termination condition. A termination condition determines
/// when the solver should give up searching for solutions.
pub trait TerminationCondition {
    /// Returns `true` when the solver should stop, `false` otherwise.
    fn should_stop(&mut self) -> bool;

    /// Called whenever the solver takes a decision.
    fn decision_has_been_made(&mut self) {}

    /// Called whenever the solver encounters a conflict.
    fn conflict_has_been_found(&mut self) {}
}

impl<T: TerminationCondition> TerminationCondition for Option<T> {
    fn should_stop(&mut self) -> bool {
        match self {
            Some(t) => t.should_stop(),
            None => false,
        }
    }

    fn decision_has_been_made(&mut self) {
        if let Some(t) = self {
            t.decision_has_been_made()
        }
    }

    fn conflict_has_been_found(&mut self) {
        if let Some(t) = self {
            t.conflict_has_been_found()
        }
    }
}
