pub(crate) mod all_different;
pub(crate) mod cliques;
pub(crate) mod connected_components;
pub(crate) mod cost_eval;
pub(crate) mod cycle_no_subtour;
pub(crate) mod node_degree;
pub(crate) mod one_tree;
pub(crate) mod path_no_cycle;
pub(crate) mod transitivity;
pub(crate) mod tree;

pub(crate) use all_different::AllDifferentSuccessorsPropagator;
pub(crate) use cliques::KCliquesPropagator;
pub(crate) use connected_components::KConnectedComponentsPropagator;
pub(crate) use cost_eval::CycleCostPropagator;
pub(crate) use cost_eval::PathCostPropagator;
pub(crate) use cycle_no_subtour::CycleNoSubtourPropagator;
pub(crate) use node_degree::DegreeOrientation;
pub(crate) use node_degree::NodeDegreePropagator;
pub(crate) use one_tree::OneTreeRelaxationPropagator;
pub(crate) use path_no_cycle::PathNoCyclePropagator;
pub(crate) use transitivity::TransitivityPropagator;
pub(crate) use tree::TreePropagator;
