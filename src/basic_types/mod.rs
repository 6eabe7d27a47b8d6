mod conflict;
mod constraint_operation_error;
mod csp_solver_execution_flag;
mod solution;
mod trail;

pub use conflict::Cause;
pub use conflict::Conflict;
pub use conflict::ConflictReason;
pub(crate) use conflict::PropagationStatusCP;
pub use conflict::VariableRef;
pub use constraint_operation_error::ConstraintOperationError;
pub(crate) use csp_solver_execution_flag::CSPSolverExecutionFlag;
pub use solution::GraphSolution;
pub use solution::Solution;
pub(crate) use trail::Trail;
