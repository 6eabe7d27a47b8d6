use std::collections::VecDeque;

use fixedbitset::FixedBitSet;

use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagatorId;

/// The multi-level propagation queue: one FIFO per [`Priority`] tier.
///
/// Popping scans the tiers from most to least urgent, so an expensive propagator only runs
/// once everything cheaper scheduled at the same instant has drained; there are only seven
/// tiers, so the scan beats any bookkeeping. FIFO order within a tier together with
/// post-order propagator ids keeps runs deterministic. A membership bitset keeps every
/// propagator enqueued at most once, which is what coalesces its pending events into a
/// single execution.
#[derive(Debug, Clone)]
pub(crate) struct PropagatorQueue {
    tiers: Vec<VecDeque<PropagatorId>>,
    enqueued: FixedBitSet,
}

impl Default for PropagatorQueue {
    fn default() -> Self {
        PropagatorQueue {
            tiers: vec![VecDeque::new(); Priority::NUM_TIERS],
            enqueued: FixedBitSet::new(),
        }
    }
}

impl PropagatorQueue {
    pub(crate) fn enqueue_propagator(&mut self, propagator_id: PropagatorId, priority: Priority) {
        let slot = propagator_id.0 as usize;
        if self.enqueued.len() <= slot {
            self.enqueued.grow(slot + 1);
        }
        if self.enqueued.contains(slot) {
            return;
        }
        self.enqueued.insert(slot);
        self.tiers[priority as usize].push_back(propagator_id);
    }

    pub(crate) fn pop(&mut self) -> Option<PropagatorId> {
        for tier in &mut self.tiers {
            if let Some(propagator_id) = tier.pop_front() {
                self.enqueued.set(propagator_id.0 as usize, false);
                return Some(propagator_id);
            }
        }
        None
    }

    pub(crate) fn clear(&mut self) {
        for tier in &mut self.tiers {
            tier.clear();
        }
        self.enqueued.clear();
    }

    pub(crate) fn is_propagator_enqueued(&self, propagator_id: PropagatorId) -> bool {
        let slot = propagator_id.0 as usize;
        slot < self.enqueued.len() && self.enqueued.contains(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popping_respects_priority_then_fifo_order() {
        let mut queue = PropagatorQueue::default();

        queue.enqueue_propagator(PropagatorId(1), Priority::Binary);
        queue.enqueue_propagator(PropagatorId(0), Priority::Linear);
        queue.enqueue_propagator(PropagatorId(3), Priority::VerySlow);
        queue.enqueue_propagator(PropagatorId(4), Priority::Linear);

        assert_eq!(Some(PropagatorId(1)), queue.pop());
        assert_eq!(Some(PropagatorId(0)), queue.pop());
        assert_eq!(Some(PropagatorId(4)), queue.pop());
        assert_eq!(Some(PropagatorId(3)), queue.pop());
        assert_eq!(None, queue.pop());
    }

    #[test]
    fn a_propagator_is_enqueued_at_most_once() {
        let mut queue = PropagatorQueue::default();

        queue.enqueue_propagator(PropagatorId(2), Priority::Unary);
        queue.enqueue_propagator(PropagatorId(2), Priority::Unary);
        assert!(queue.is_propagator_enqueued(PropagatorId(2)));

        assert_eq!(Some(PropagatorId(2)), queue.pop());
        assert_eq!(None, queue.pop());
        assert!(!queue.is_propagator_enqueued(PropagatorId(2)));
    }

    #[test]
    fn a_popped_propagator_can_be_enqueued_again() {
        let mut queue = PropagatorQueue::default();

        queue.enqueue_propagator(PropagatorId(0), Priority::Ternary);
        assert_eq!(Some(PropagatorId(0)), queue.pop());

        queue.enqueue_propagator(PropagatorId(0), Priority::Ternary);
        assert_eq!(Some(PropagatorId(0)), queue.pop());
    }

    #[test]
    fn clearing_resets_the_queue() {
        let mut queue = PropagatorQueue::default();

        queue.enqueue_propagator(PropagatorId(0), Priority::Cubic);
        queue.enqueue_propagator(PropagatorId(1), Priority::Ternary);
        queue.clear();

        assert_eq!(None, queue.pop());
        assert!(!queue.is_propagator_enqueued(PropagatorId(0)));

        // The queue is usable after clearing.
        queue.enqueue_propagator(PropagatorId(1), Priority::Unary);
        assert_eq!(Some(PropagatorId(1)), queue.pop());
    }
}
