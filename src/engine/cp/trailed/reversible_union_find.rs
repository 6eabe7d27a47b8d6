use crate::engine::propagation::ManipulateTrailedValues;
use super::TrailedInt;

/// A union-find over the nodes `0..n` whose parent and size cells live on the trail, so that
/// backtracking splits the sets back apart for free.
///
/// There is no path compression (compression would not be reversible); union by size keeps
/// `find` at O(log n).
#[derive(Debug, Clone)]
pub(crate) struct ReversibleUnionFind {
    parent: Vec<TrailedInt>,
    size: Vec<TrailedInt>,
    /// An arbitrary per-set payload, stored at the set representative. Used by the tree
    /// propagator to track the terminal of each out-arc chain.
    label: Vec<TrailedInt>,
}

impl ReversibleUnionFind {
    pub(crate) fn new(
        num_nodes: usize,
        mut new_trailed_integer: impl FnMut(i64) -> TrailedInt,
    ) -> Self {
        ReversibleUnionFind {
            parent: (0..num_nodes)
                .map(|i| new_trailed_integer(i as i64))
                .collect(),
            size: (0..num_nodes).map(|_| new_trailed_integer(1)).collect(),
            label: (0..num_nodes)
                .map(|i| new_trailed_integer(i as i64))
                .collect(),
        }
    }

    pub(crate) fn find(&self, context: &impl ManipulateTrailedValues, node: u32) -> u32 {
        let mut current = node;
        loop {
            let parent = self.parent_of(context, current);
            if parent == current {
                return current;
            }
            current = parent;
        }
    }

    /// Merges the sets of `a` and `b`. Returns `false` if they were already the same set.
    pub(crate) fn union(
        &self,
        context: &mut impl ManipulateTrailedValues,
        a: u32,
        b: u32,
    ) -> bool {
        let root_a = self.find(context, a);
        let root_b = self.find(context, b);
        if root_a == root_b {
            return false;
        }

        let size_a = context.value(self.size[root_a as usize]);
        let size_b = context.value(self.size[root_b as usize]);
        let (child, root) = if size_a <= size_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };

        context.assign(self.parent[child as usize], root as i64);
        context.assign(self.size[root as usize], size_a + size_b);
        true
    }

    pub(crate) fn read_label(&self, context: &impl ManipulateTrailedValues, node: u32) -> i64 {
        let root = self.find(context, node);
        context.value(self.label[root as usize])
    }

    pub(crate) fn write_label(
        &self,
        context: &mut impl ManipulateTrailedValues,
        node: u32,
        label: i64,
    ) {
        let root = self.find(context, node);
        context.assign(self.label[root as usize], label);
    }

    fn parent_of(&self, context: &impl ManipulateTrailedValues, node: u32) -> u32 {
        context.value(self.parent[node as usize]) as u32
    }
}
