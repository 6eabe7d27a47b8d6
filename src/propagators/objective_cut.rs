use std::cell::Cell;
use std::rc::Rc;

use crate::basic_types::PropagationStatusCP;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::options::OptimisationDirection;
use crate::variables::DomainId;

/// The branch-and-bound cut: once an incumbent with objective value `v` exists, every later
/// solution must improve on it (`obj <= v - 1` when minimising).
///
/// The bound lives in a shared cell owned by the optimisation driver, which tightens it after
/// each solution and re-schedules this propagator. The bound only ever tightens, so it is
/// deliberately *not* trailed: it must survive backtracking.
#[derive(Debug)]
pub(crate) struct ObjectiveCutPropagator {
    objective: DomainId,
    direction: OptimisationDirection,
    cut: Rc<Cell<Option<i32>>>,
}

impl ObjectiveCutPropagator {
    pub(crate) fn new(
        objective: DomainId,
        direction: OptimisationDirection,
        cut: Rc<Cell<Option<i32>>>,
    ) -> Self {
        ObjectiveCutPropagator {
            objective,
            direction,
            cut,
        }
    }
}

impl Propagator for ObjectiveCutPropagator {
    fn name(&self) -> &str {
        "ObjectiveCut"
    }

    fn priority(&self) -> Priority {
        Priority::Unary
    }

    fn initialise_at_root(
        &mut self,
        _context: &mut PropagatorInitialisationContext,
    ) -> PropagationStatusCP {
        // No subscriptions: the driver schedules this propagator whenever the cut moves.
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let Some(bound) = self.cut.get() else {
            return Ok(());
        };
        match self.direction {
            OptimisationDirection::Minimise => context.set_upper_bound(&self.objective, bound),
            OptimisationDirection::Maximise => context.set_lower_bound(&self.objective, bound),
        }
    }
}
