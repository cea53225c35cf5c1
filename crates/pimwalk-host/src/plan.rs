//! Per-round launch plan: how a [`ShardPlan`] turns into byte sizes and
//! launch arguments.

use pimwalk_common::{
    CapacityError, HeapLayout, KernelId, LaunchArguments, PimError, Result, ShardPlan, align_up,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchPlan {
    shards: ShardPlan,
    kernel: KernelId,
    element_size: usize,
    transfer_size: usize,
    granularity: usize,
}

impl LaunchPlan {
    /// `element_size` is the byte width of one dataset element (an `i32`
    /// for vector-add, an edge record for the walks).
    pub fn new(
        shards: ShardPlan,
        kernel: KernelId,
        element_size: usize,
        granularity: usize,
    ) -> Result<Self> {
        if element_size == 0 {
            return Err(PimError::Config("element size must be > 0".into()));
        }
        let transfer_size = align_up(shards.shard_len() * element_size, granularity);
        if u32::try_from(transfer_size).is_err() {
            return Err(PimError::Config(format!(
                "shard of {transfer_size} bytes does not fit a 32-bit launch argument"
            )));
        }
        Ok(Self { shards, kernel, element_size, transfer_size, granularity })
    }

    pub fn shards(&self) -> &ShardPlan {
        &self.shards
    }

    pub fn kernel(&self) -> KernelId {
        self.kernel
    }

    pub fn count(&self) -> usize {
        self.shards.count()
    }

    /// Bytes every accelerator receives per input array.
    pub fn transfer_size(&self) -> usize {
        self.transfer_size
    }

    /// Elements per accelerator slot in the padded host buffers.
    pub fn slot_elements(&self) -> usize {
        self.transfer_size / self.element_size
    }

    /// Host buffer length (elements) so every accelerator gets a full slot.
    pub fn padded_elements(&self) -> usize {
        self.slot_elements() * self.count()
    }

    pub fn heap_layout(&self) -> HeapLayout {
        HeapLayout::new(self.kernel, self.transfer_size, self.granularity)
    }

    /// One record per accelerator; `size` is that accelerator's occupied bytes.
    pub fn arguments(&self) -> Vec<LaunchArguments> {
        self.shards
            .shards()
            .map(|shard| {
                LaunchArguments::new(
                    (shard.len * self.element_size) as u32,
                    self.transfer_size as u32,
                    self.kernel,
                )
            })
            .collect()
    }

    /// Lay `data` out in accelerator slots, zero-padding each slot.
    pub fn scatter<T: Copy + Default>(&self, data: &[T]) -> Vec<T> {
        let slot = self.slot_elements();
        let mut padded = vec![T::default(); self.padded_elements()];
        for (rank, shard) in self.shards.shards().enumerate() {
            padded[rank * slot..rank * slot + shard.len].copy_from_slice(&data[shard.range()]);
        }
        padded
    }

    /// Inverse of [`Self::scatter`]: drop the padding of every slot.
    pub fn gather<T: Copy>(&self, padded: &[T]) -> Vec<T> {
        self.gather_slots(padded, self.slot_elements())
    }

    /// Like [`Self::gather`] for a buffer whose slots are `slot` elements
    /// apart, e.g. a region padded further to the transfer granularity.
    pub fn gather_slots<T: Copy>(&self, padded: &[T], slot: usize) -> Vec<T> {
        self.shards
            .shards()
            .enumerate()
            .flat_map(|(rank, shard)| padded[rank * slot..rank * slot + shard.len].iter().copied())
            .collect()
    }

    /// Static device-memory check, before any transfer.
    pub fn check_device_memory(&self, nr_tasklets: usize, capacity: usize) -> Result<()> {
        let required = self.heap_layout().end(nr_tasklets);
        if required > capacity {
            return Err(CapacityError::DeviceMemory { required, capacity }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pimwalk_common::Edge;

    #[test]
    fn test_vector_add_plan_even() {
        let plan = LaunchPlan::new(ShardPlan::new(512, 4).unwrap(), KernelId::VectorAdd, 4, 8).unwrap();
        assert_eq!(plan.transfer_size(), 512);
        assert_eq!(plan.padded_elements(), 512);
        assert!(plan.arguments().iter().all(|a| a.size == 512 && a.transfer_size == 512));
    }

    #[test]
    fn test_transfer_size_rounds_to_granularity() {
        // 10 elements over 4 accelerators: shard of 3 i32 = 12 bytes -> 16
        let plan = LaunchPlan::new(ShardPlan::new(10, 4).unwrap(), KernelId::VectorAdd, 4, 8).unwrap();
        assert_eq!(plan.transfer_size(), 16);
        assert_eq!(plan.slot_elements(), 4);
        let sizes: Vec<u32> = plan.arguments().iter().map(|a| a.size).collect();
        assert_eq!(sizes, vec![12, 12, 12, 4]);
    }

    #[test]
    fn test_gather_with_wider_slots() {
        let plan = LaunchPlan::new(ShardPlan::new(3, 2).unwrap(), KernelId::EdgeScan, Edge::SIZE, 32).unwrap();
        // two edges per shard: 32 bytes, trace of 16 bytes padded to 32
        let trace = plan.heap_layout().arrays()[1];
        assert_eq!(trace.len, 32);
        let padded = [1i64, 2, 0, 0, 3, 0, 0, 0];
        assert_eq!(plan.gather_slots(&padded, trace.len / 8), vec![1, 2, 3]);
    }

    #[test]
    fn test_scatter_gather_slots() {
        let plan = LaunchPlan::new(ShardPlan::new(10, 4).unwrap(), KernelId::VectorAdd, 4, 8).unwrap();
        let data: Vec<i32> = (1..=10).collect();
        let padded = plan.scatter(&data);
        assert_eq!(padded, vec![1, 2, 3, 0, 4, 5, 6, 0, 7, 8, 9, 0, 10, 0, 0, 0]);
        assert_eq!(plan.gather(&padded), data);
    }

    #[test]
    fn test_device_memory_check() {
        let plan =
            LaunchPlan::new(ShardPlan::new(1024, 1).unwrap(), KernelId::EdgeReduce, Edge::SIZE, 8).unwrap();
        assert!(plan.check_device_memory(16, 1 << 20).is_ok());
        assert!(matches!(
            plan.check_device_memory(16, 1024),
            Err(PimError::Capacity(CapacityError::DeviceMemory { .. }))
        ));
    }
}
