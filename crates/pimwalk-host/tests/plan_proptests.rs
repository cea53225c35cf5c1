//! Property-based tests for launch planning.

use pimwalk_common::{Edge, KernelId, ShardPlan};
use pimwalk_host::LaunchPlan;
use proptest::prelude::*;

proptest! {
    /// Occupied bytes over all accelerators add up to the dataset.
    #[test]
    fn prop_argument_sizes_cover_dataset(total in 1usize..5_000, count in 1usize..32) {
        let plan = LaunchPlan::new(ShardPlan::new(total, count).unwrap(), KernelId::VectorAdd, 4, 8).unwrap();
        let args = plan.arguments();
        prop_assert_eq!(args.len(), count);
        let occupied: usize = args.iter().map(|a| a.size as usize).sum();
        prop_assert_eq!(occupied, total * 4);
        for a in &args {
            prop_assert!(a.size <= a.transfer_size);
            prop_assert_eq!(a.transfer_size as usize % 8, 0);
        }
    }

    /// Scattering into padded slots and gathering back is lossless.
    #[test]
    fn prop_scatter_gather_lossless(data in prop::collection::vec(any::<i32>(), 1..1_000), count in 1usize..16) {
        let plan = LaunchPlan::new(ShardPlan::new(data.len(), count).unwrap(), KernelId::VectorAdd, 4, 8).unwrap();
        let padded = plan.scatter(&data);
        prop_assert_eq!(padded.len(), plan.padded_elements());
        prop_assert_eq!(plan.gather(&padded), data);
    }

    /// Edge slots never need padding: records are already granule-sized.
    #[test]
    fn prop_edge_slots_match_shards(total in 1usize..5_000, count in 1usize..32) {
        let shards = ShardPlan::new(total, count).unwrap();
        let plan = LaunchPlan::new(shards, KernelId::EdgeReduce, Edge::SIZE, 8).unwrap();
        prop_assert_eq!(plan.slot_elements(), shards.shard_len());
    }
}
