use crate::variables::DomainId;
use crate::variables::GraphId;

/// A choice made by the search: a unary reduction on an integer or graph variable. Every
/// decision has a dual, applied on the second branch after the first one failed, so that the
/// two branches partition the search space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Fix the variable to the value; dual: remove the value.
    Assign(DomainId, i32),
    /// Remove the value; dual: fix the variable to it.
    RemoveValue(DomainId, i32),
    /// Constrain the variable to be at most the value; dual: at least the value plus one.
    SplitLessOrEqual(DomainId, i32),
    /// Constrain the variable to be at least the value; dual: at most the value minus one.
    SplitGreaterOrEqual(DomainId, i32),
    /// Make the arc mandatory; dual: remove it from the envelope.
    EnforceArc(GraphId, u32, u32),
    /// Remove the arc from the envelope; dual: make it mandatory.
    RemoveArc(GraphId, u32, u32),
}

impl Decision {
    /// The decision applied on the second branch.
    pub fn negation(&self) -> Decision {
        match *self {
            Decision::Assign(domain, value) => Decision::RemoveValue(domain, value),
            Decision::RemoveValue(domain, value) => Decision::Assign(domain, value),
            Decision::SplitLessOrEqual(domain, value) => {
                Decision::SplitGreaterOrEqual(domain, value + 1)
            }
            Decision::SplitGreaterOrEqual(domain, value) => {
                Decision::SplitLessOrEqual(domain, value - 1)
            }
            Decision::EnforceArc(graph, from, to) => Decision::RemoveArc(graph, from, to),
            Decision::RemoveArc(graph, from, to) => Decision::EnforceArc(graph, from, to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_is_an_involution() {
        let g = GraphId { id: 0 };
        let x = DomainId { id: 0 };
        let decisions = [
            Decision::Assign(x, 3),
            Decision::SplitLessOrEqual(x, 2),
            Decision::EnforceArc(g, 0, 1),
            Decision::RemoveArc(g, 1, 2),
        ];
        for decision in decisions {
            assert_eq!(decision, decision.negation().negation());
        }
    }
}
