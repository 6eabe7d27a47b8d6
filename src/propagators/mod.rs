pub(crate) mod graph;
pub(crate) mod objective_cut;

pub(crate) use objective_cut::ObjectiveCutPropagator;
