use crate::branching::Brancher;
use crate::branching::Decision;
use crate::branching::SelectionContext;
use crate::variables::DomainId;

/// Branches on the first unassigned variable in the given order, assigning its lower bound
/// on the first branch.
#[derive(Clone, Debug)]
pub struct InputOrderIntBrancher {
    variables: Vec<DomainId>,
}

impl InputOrderIntBrancher {
    pub fn new(variables: Vec<DomainId>) -> Self {
        InputOrderIntBrancher { variables }
    }
}

impl Brancher for InputOrderIntBrancher {
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Decision> {
        self.variables
            .iter()
            .find(|variable| !context.is_assigned(*variable))
            .map(|&variable| Decision::Assign(variable, context.lower_bound(&variable)))
    }
}
