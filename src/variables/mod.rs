mod affine_view;
mod domain_id;
pub mod edge_sets;
mod graph_id;
mod integer_variable;
mod literal;
mod sum_view;

pub use affine_view::AffineView;
pub use domain_id::DomainId;
pub use graph_id::GraphId;
pub use integer_variable::IntegerVariable;
pub use literal::Literal;
pub use sum_view::SumView;
