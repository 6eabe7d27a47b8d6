//! The explanation recorder. Every domain mutation that survives (i.e. was not undone by the
//! conflict that followed it) is reported to a sink as a `(variable, event, value, cause)`
//! record. The default sink discards; [`RecordedExplanations`] keeps the per-event reasons a
//! learning search needs for nogood extraction. No sink is ever required for soundness.

use std::fmt::Debug;

use enumset::EnumSet;
use fnv::FnvHashMap;

use crate::basic_types::Cause;
use crate::basic_types::VariableRef;
use crate::engine::cp::domain_events::GraphUpdate;
use crate::engine::cp::domain_events::IntEvent;

/// One recorded domain mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedChange {
    pub variable: VariableRef,
    pub update: RecordedUpdate,
    pub cause: Cause,
}

/// What changed, with enough payload to replay the event against a learning engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedUpdate {
    /// An integer reduction: the emitted event set and the bounds right after the change.
    Integer {
        events: EnumSet<IntEvent>,
        lower_bound: i32,
        upper_bound: i32,
    },
    /// A graph reduction with its payload.
    Graph(GraphUpdate),
}

/// A consumer of domain-change records.
pub trait ExplanationSink: Debug {
    fn record(&mut self, change: RecordedChange);

    /// Called when the search opens a new decision level.
    fn on_new_decision_level(&mut self) {}

    /// Called after backtracking; records made past the target level are stale.
    fn on_backtrack(&mut self, _new_decision_level: usize) {}
}

/// The default sink: discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExplanations;

impl ExplanationSink for NoopExplanations {
    fn record(&mut self, _change: RecordedChange) {}
}

/// A sink which keeps the records, synchronised with the decision stack, and indexes them per
/// variable so that reasons for an event can be looked up during learning.
#[derive(Debug, Default)]
pub struct RecordedExplanations {
    records: Vec<RecordedChange>,
    /// At index i, the number of records that existed when decision level i + 1 was opened.
    level_delimiters: Vec<usize>,
    per_variable: FnvHashMap<VariableRef, Vec<usize>>,
}

impl RecordedExplanations {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordedChange> {
        self.records.iter()
    }

    /// The records concerning the given variable, oldest first.
    pub fn reasons_for(&self, variable: VariableRef) -> impl Iterator<Item = &RecordedChange> {
        self.per_variable
            .get(&variable)
            .into_iter()
            .flatten()
            .map(|&index| &self.records[index])
    }
}

impl ExplanationSink for RecordedExplanations {
    fn record(&mut self, change: RecordedChange) {
        self.per_variable
            .entry(change.variable)
            .or_default()
            .push(self.records.len());
        self.records.push(change);
    }

    fn on_new_decision_level(&mut self) {
        self.level_delimiters.push(self.records.len());
    }

    fn on_backtrack(&mut self, new_decision_level: usize) {
        let keep = self
            .level_delimiters
            .get(new_decision_level)
            .copied()
            .unwrap_or(self.records.len());
        self.level_delimiters.truncate(new_decision_level);

        for stale in self.records.drain(keep..) {
            let indices = self
                .per_variable
                .get_mut(&stale.variable)
                .expect("every record is indexed");
            let _ = indices.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use enumset::enum_set;

    use crate::variables::DomainId;
    use super::*;

    fn change(id: u32, lower_bound: i32) -> RecordedChange {
        RecordedChange {
            variable: VariableRef::Integer(DomainId { id }),
            update: RecordedUpdate::Integer {
                events: enum_set!(IntEvent::LowerBound),
                lower_bound,
                upper_bound: 10,
            },
            cause: Cause::Search,
        }
    }

    #[test]
    fn records_are_indexed_per_variable() {
        let mut sink = RecordedExplanations::default();
        sink.record(change(0, 1));
        sink.record(change(1, 2));
        sink.record(change(0, 3));

        let reasons: Vec<_> = sink
            .reasons_for(VariableRef::Integer(DomainId { id: 0 }))
            .collect();
        assert_eq!(reasons.len(), 2);
    }

    #[test]
    fn backtracking_forgets_stale_records() {
        let mut sink = RecordedExplanations::default();
        sink.record(change(0, 1));
        sink.on_new_decision_level();
        sink.record(change(0, 2));
        sink.record(change(1, 3));
        assert_eq!(sink.len(), 3);

        sink.on_backtrack(0);
        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink.reasons_for(VariableRef::Integer(DomainId { id: 1 }))
                .count(),
            0
        );
    }
}
