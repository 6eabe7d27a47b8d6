mod composite;
mod first_envelope_arc;
mod input_order;
mod min_cost_arc;
mod random_arc;

pub use composite::CompositeBrancher;
pub use first_envelope_arc::FirstEnvelopeArcBrancher;
pub use input_order::InputOrderIntBrancher;
pub use min_cost_arc::MinCostArcBrancher;
pub use random_arc::RandomArcBrancher;
