use crate::containers::StorageKey;

/// The handle of a graph variable in the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GraphId {
    pub(crate) id: u32,
}

impl StorageKey for GraphId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        GraphId { id: index as u32 }
    }
}

impl std::fmt::Display for GraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.id)
    }
}
