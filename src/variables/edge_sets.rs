//! Helpers for building the envelope edge sets of freshly created graph variables.

/// Every undirected edge `(i, j)` with `i < j` over `n` nodes.
pub fn complete_edges(num_nodes: u32) -> Vec<(u32, u32)> {
    let n = num_nodes as usize;
    let mut edges = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..num_nodes {
        for j in (i + 1)..num_nodes {
            edges.push((i, j));
        }
    }
    edges
}

/// Every directed arc `(i, j)` with `i != j` over `n` nodes, optionally including the
/// self-loops `(i, i)`.
pub fn complete_arcs(num_nodes: u32, include_self_loops: bool) -> Vec<(u32, u32)> {
    let mut arcs = Vec::new();
    for i in 0..num_nodes {
        for j in 0..num_nodes {
            if i != j || include_self_loops {
                arcs.push((i, j));
            }
        }
    }
    arcs
}
