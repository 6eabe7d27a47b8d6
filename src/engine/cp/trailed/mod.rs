mod reversible_union_find;
mod trailed_values;

pub(crate) use reversible_union_find::ReversibleUnionFind;
pub(crate) use trailed_values::TrailedInt;
pub(crate) use trailed_values::TrailedValues;
