//! Property-based tests for the partitioning arithmetic.
//!
//! - `ShardPlan` shards tile the dataset exactly once, in order
//! - `BlockSchedule`s of all tasklets tile a shard exactly once
//! - `WalkStatus::merge` is order-independent

use pimwalk_common::{BlockSchedule, ShardPlan, WalkStatus, ceil_div};
use proptest::prelude::*;

// ── Shard plan ──────────────────────────────────────────────────────────────

proptest! {
    /// Concatenating every shard reproduces `0..total` without gaps or overlap.
    #[test]
    fn prop_shards_tile_dataset(total in 1usize..10_000, count in 1usize..64) {
        let plan = ShardPlan::new(total, count).unwrap();
        let mut cursor = 0;
        for span in plan.shards() {
            prop_assert_eq!(span.offset, cursor);
            prop_assert!(span.len <= plan.shard_len());
            cursor = span.end();
        }
        prop_assert_eq!(cursor, total);
        prop_assert!(plan.padded_len() >= total);
        prop_assert_eq!(plan.shard_len(), ceil_div(total, count));
    }

    /// Padding never exceeds one element per accelerator.
    #[test]
    fn prop_padding_is_bounded(total in 1usize..10_000, count in 1usize..64) {
        let plan = ShardPlan::new(total, count).unwrap();
        prop_assert!(plan.padded_len() - total < count);
    }
}

// ── Block schedule ──────────────────────────────────────────────────────────

proptest! {
    /// Every byte below `limit` is visited by exactly one tasklet.
    #[test]
    fn prop_blocks_cover_shard_once(
        nr_tasklets in 1usize..=24,
        block_exp in 4u32..=11,
        limit in 0usize..40_000,
    ) {
        let block_size = 1usize << block_exp;
        let mut hits = vec![0u8; limit];
        for tasklet in 0..nr_tasklets {
            for span in BlockSchedule::new(tasklet, nr_tasklets, block_size, limit) {
                prop_assert!(span.len > 0 && span.len <= block_size);
                prop_assert_eq!(span.offset % block_size, 0);
                for byte in &mut hits[span.range()] {
                    *byte += 1;
                }
            }
        }
        prop_assert!(hits.iter().all(|&h| h == 1));
    }
}

// ── Walk status ─────────────────────────────────────────────────────────────

fn arb_status() -> impl Strategy<Value = WalkStatus> {
    prop_oneof![
        Just(WalkStatus::Processed),
        Just(WalkStatus::SpecialOnly { edge_num: 0 }),
        Just(WalkStatus::Empty),
    ]
}

proptest! {
    #[test]
    fn prop_merge_is_order_independent(statuses in prop::collection::vec(arb_status(), 0..16)) {
        let forward = statuses.iter().fold(WalkStatus::Empty, |acc, s| acc.merge(*s));
        let backward = statuses.iter().rev().fold(WalkStatus::Empty, |acc, s| acc.merge(*s));
        prop_assert_eq!(forward, backward);
    }
}
