use std::fmt::Debug;
use std::ops::Index;
use std::ops::IndexMut;

use crate::containers::KeyedVec;
use super::Propagator;
use super::PropagatorId;

/// The owner of all posted propagators, indexed by [`PropagatorId`].
#[derive(Default)]
pub(crate) struct PropagatorStore {
    propagators: KeyedVec<PropagatorId, Box<dyn Propagator>>,
}

impl PropagatorStore {
    pub(crate) fn alloc(&mut self, propagator: Box<dyn Propagator>) -> PropagatorId {
        self.propagators.push(propagator)
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = PropagatorId> {
        self.propagators.keys()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Propagator>> {
        self.propagators.iter_mut()
    }
}

impl Index<PropagatorId> for PropagatorStore {
    type Output = Box<dyn Propagator>;

    fn index(&self, index: PropagatorId) -> &Self::Output {
        &self.propagators[index]
    }
}

impl IndexMut<PropagatorId> for PropagatorStore {
    fn index_mut(&mut self, index: PropagatorId) -> &mut Self::Output {
        &mut self.propagators[index]
    }
}

impl Debug for PropagatorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.propagators.iter().map(|p| p.name()))
            .finish()
    }
}
