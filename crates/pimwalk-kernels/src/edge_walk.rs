//! Edge-walk kernels.
//!
//! Both kernels scan one block of [`Edge`] records and fold the weight of
//! every regular edge leaving `here` into the walker. Special edges are
//! counted for the status but never summed. Edges leaving other nodes are
//! counted as processed and otherwise ignored.

use pimwalk_common::{Edge, NodeId, WalkStatus, WalkerState};

/// Sum weights of the regular edges leaving `here`.
pub fn reduce_edges(walker: &mut WalkerState, here: NodeId, edges: &[Edge]) -> WalkStatus {
    walk(walker, here, edges, |_, _| {})
}

/// Like [`reduce_edges`], also recording the walker's sum *before* each
/// matching edge into `trace[i]`.
///
/// Trace slots of non-matching edges are left untouched.
pub fn scan_edges(
    walker: &mut WalkerState,
    here: NodeId,
    edges: &[Edge],
    trace: &mut [i64],
) -> WalkStatus {
    debug_assert!(trace.len() >= edges.len());
    walk(walker, here, edges, |i, before| {
        if let Some(slot) = trace.get_mut(i) {
            *slot = before;
        }
    })
}

fn walk(
    walker: &mut WalkerState,
    here: NodeId,
    edges: &[Edge],
    mut on_match: impl FnMut(usize, i64),
) -> WalkStatus {
    let mut edge_num = 0usize;
    let mut special_edge_num = 0usize;
    for (i, edge) in edges.iter().enumerate() {
        if edge.is_special() {
            special_edge_num += 1;
            continue;
        }
        edge_num += 1;
        if edge.src == here {
            on_match(i, walker.sum);
            walker.sum = walker.sum.wrapping_add(i64::from(edge.weight));
            walker.matched += 1;
        }
    }
    WalkStatus::from_counts(edge_num, special_edge_num)
}
