//! Host reference kernels (verification oracle).
//!
//! Same arithmetic as the device kernels, applied to the whole dataset. The
//! scan trace depends on the order in which each tasklet meets its edges, so
//! [`edge_scan`] replays the device's block schedule shard by shard.

use pimwalk_common::{BlockSchedule, Edge, NodeId, ShardPlan, WalkStatus, WalkerState};
use rayon::prelude::*;

use crate::edge_walk::{reduce_edges, scan_edges};

/// `a[i] + b[i]`, wrapping.
pub fn vector_add(a: &[i32], b: &[i32]) -> Vec<i32> {
    a.par_iter().zip(b.par_iter()).map(|(x, y)| x.wrapping_add(*y)).collect()
}

/// Walker state and status after folding every edge of `edges`.
///
/// The status equals the merge of the per-block statuses of any block
/// split of `edges`, so it is the expected status of a whole shard.
pub fn edge_reduce(edges: &[Edge], here: NodeId) -> (WalkerState, WalkStatus) {
    let mut walker = WalkerState::new();
    let status = reduce_edges(&mut walker, here, edges);
    (walker, status)
}

/// Scan trace of one accelerator's shard.
///
/// Every tasklet starts from a zero walker and visits its blocks in
/// schedule order; trace slots of non-matching edges stay 0.
pub fn edge_scan_shard(
    edges: &[Edge],
    here: NodeId,
    nr_tasklets: usize,
    block_size: usize,
) -> Vec<i64> {
    let mut trace = vec![0i64; edges.len()];
    let limit = edges.len() * Edge::SIZE;
    for tasklet in 0..nr_tasklets {
        let mut walker = WalkerState::new();
        for block in BlockSchedule::new(tasklet, nr_tasklets, block_size, limit) {
            let range = block.scale_down(Edge::SIZE).range();
            // the shard's status comes from `edge_reduce`
            scan_edges(&mut walker, here, &edges[range.clone()], &mut trace[range]);
        }
    }
    trace
}

/// Scan trace of the whole dataset under `plan`.
pub fn edge_scan(
    edges: &[Edge],
    here: NodeId,
    plan: &ShardPlan,
    nr_tasklets: usize,
    block_size: usize,
) -> Vec<i64> {
    let shards: Vec<_> = plan.shards().collect();
    shards
        .par_iter()
        .map(|shard| edge_scan_shard(&edges[shard.range()], here, nr_tasklets, block_size))
        .flatten_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_add_reference() {
        assert_eq!(vector_add(&[1, i32::MAX], &[2, 1]), vec![3, i32::MIN]);
    }

    #[test]
    fn test_edge_reduce_reference() {
        let edges = [Edge::regular(1, 0, 5), Edge::regular(2, 0, 7), Edge::special(1, 0, 9)];
        let (walker, status) = edge_reduce(&edges, 1);
        assert_eq!(walker.sum, 5);
        assert_eq!(walker.matched, 1);
        assert_eq!(status, WalkStatus::Processed);
    }

    #[test]
    fn test_edge_reduce_reference_status() {
        let specials = [Edge::special(1, 0, 9), Edge::special(2, 0, 4)];
        assert_eq!(edge_reduce(&specials, 1).1, WalkStatus::SpecialOnly { edge_num: 0 });
        assert_eq!(edge_reduce(&[], 1).1, WalkStatus::Empty);
    }

    #[test]
    fn test_edge_scan_shard_restarts_per_tasklet() {
        // 16-byte blocks hold one edge each; two tasklets alternate edges.
        let edges = vec![Edge::regular(3, 0, 1); 4];
        let trace = edge_scan_shard(&edges, 3, 2, Edge::SIZE);
        assert_eq!(trace, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_edge_scan_single_tasklet_is_prefix_sum() {
        let edges: Vec<_> = (1..=5).map(|w| Edge::regular(0, 1, w)).collect();
        let trace = edge_scan_shard(&edges, 0, 1, 2 * Edge::SIZE);
        assert_eq!(trace, vec![0, 1, 3, 6, 10]);
    }

    #[test]
    fn test_edge_scan_concatenates_shards() {
        let edges = vec![Edge::regular(0, 1, 2); 6];
        let plan = ShardPlan::new(edges.len(), 2).unwrap();
        let trace = edge_scan(&edges, 0, &plan, 1, 1024);
        assert_eq!(trace, vec![0, 2, 4, 0, 2, 4]);
    }
}
