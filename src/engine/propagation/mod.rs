pub(crate) mod contexts;
pub(crate) mod local_id;
pub(crate) mod propagator;
pub(crate) mod propagator_id;
pub(crate) mod store;

pub(crate) use contexts::ManipulateTrailedValues;
pub(crate) use contexts::PropagationContext;
pub(crate) use contexts::PropagationContextMut;
pub(crate) use contexts::PropagationContextWithTrailedValues;
pub(crate) use contexts::PropagatorInitialisationContext;
pub(crate) use contexts::ReadDomains;
pub(crate) use local_id::LocalId;
pub(crate) use propagator::EnqueueDecision;
pub(crate) use propagator::Entailment;
pub(crate) use propagator::Priority;
pub(crate) use propagator::Propagator;
pub use propagator_id::PropagatorId;
pub(crate) use propagator_id::PropagatorVarId;
pub(crate) use store::PropagatorStore;
