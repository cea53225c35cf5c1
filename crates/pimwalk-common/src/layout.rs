//! Shard and block addressing.
//!
//! Both levels of the partitioning are expressed as [`Span`]s (offset +
//! length) rather than pointer walks:
//!
//! - [`ShardPlan`] splits a dataset into one contiguous shard per accelerator.
//! - [`BlockSchedule`] splits one shard round-robin across tasklets as a
//!   `(base, stride, limit)` sequence of blocks, truncating the last block
//!   at the shard boundary.

use crate::error::{PimError, Result, TransferError};
use crate::kernel_registry::KernelId;
use crate::math::{align_up, ceil_div};
use crate::types::{Edge, LaunchArguments, TaskletResult};

/// Half-open range `[offset, offset + len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    #[inline]
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.end()
    }

    /// The same span measured in units of `unit` bytes.
    pub const fn scale_down(&self, unit: usize) -> Span {
        Span { offset: self.offset / unit, len: self.len / unit }
    }
}

/// Shard size every accelerator's buffers are sized for.
///
/// `ceil(total / count)`; 0 when `count` is 0.
#[inline]
pub const fn partition(total: usize, count: usize) -> usize {
    ceil_div(total, count)
}

/// Contiguous per-accelerator shards of a dataset of `total` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardPlan {
    total: usize,
    count: usize,
    shard_len: usize,
}

impl ShardPlan {
    /// Plan `total` elements over `count` accelerators.
    ///
    /// Zero accelerators or an empty dataset are configuration errors.
    pub fn new(total: usize, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(PimError::Config("cannot partition over zero accelerators".into()));
        }
        if total == 0 {
            return Err(PimError::Config("cannot partition an empty dataset".into()));
        }
        Ok(Self { total, count, shard_len: partition(total, count) })
    }

    pub const fn total(&self) -> usize {
        self.total
    }

    pub const fn count(&self) -> usize {
        self.count
    }

    /// Nominal shard length (elements), identical for every accelerator.
    pub const fn shard_len(&self) -> usize {
        self.shard_len
    }

    /// Host buffer length that gives every accelerator a full-size slice.
    pub const fn padded_len(&self) -> usize {
        self.shard_len * self.count
    }

    /// Occupied range of `rank`'s shard, clamped to the dataset bound.
    ///
    /// Trailing shards are empty when `count` exceeds what the data fills.
    pub fn shard(&self, rank: usize) -> Span {
        let offset = (rank * self.shard_len).min(self.total);
        let len = self.shard_len.min(self.total - offset);
        Span { offset, len }
    }

    pub fn shards(&self) -> impl Iterator<Item = Span> + '_ {
        (0..self.count).map(|rank| self.shard(rank))
    }
}

/// Round-robin block sequence of one tasklet inside one shard.
///
/// Tasklet `t` of `n` visits byte offsets `t * block, t * block + n * block, ...`
/// while below `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSchedule {
    base: usize,
    stride: usize,
    block_size: usize,
    limit: usize,
}

impl BlockSchedule {
    pub const fn new(tasklet_id: usize, nr_tasklets: usize, block_size: usize, limit: usize) -> Self {
        Self {
            base: tasklet_id * block_size,
            stride: block_size * nr_tasklets,
            block_size,
            limit,
        }
    }

    pub const fn base(&self) -> usize {
        self.base
    }

    pub const fn stride(&self) -> usize {
        self.stride
    }

    pub fn blocks(&self) -> Blocks {
        Blocks { next: self.base, schedule: *self }
    }

    /// Number of blocks this tasklet will visit.
    pub fn block_count(&self) -> usize {
        if self.base >= self.limit || self.stride == 0 {
            0
        } else {
            ceil_div(self.limit - self.base, self.stride)
        }
    }
}

impl IntoIterator for BlockSchedule {
    type Item = Span;
    type IntoIter = Blocks;

    fn into_iter(self) -> Blocks {
        self.blocks()
    }
}

/// Iterator over the blocks of a [`BlockSchedule`].
#[derive(Debug, Clone)]
pub struct Blocks {
    next: usize,
    schedule: BlockSchedule,
}

impl Iterator for Blocks {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        let s = &self.schedule;
        if self.next >= s.limit || s.block_size == 0 {
            return None;
        }
        let offset = self.next;
        let len = s.block_size.min(s.limit - offset);
        self.next = offset.saturating_add(s.stride.max(1));
        Some(Span { offset, len })
    }
}

/// Device-memory heap layout of one accelerator for one launch.
///
/// Input arrays sit back to back from offset 0; the first array of every
/// kernel spans `transfer_size` bytes. Walk kernels append one
/// [`TaskletResult`] slot per tasklet after the last array. Every region
/// starts and ends on a transfer-granularity boundary so the host can move
/// it with a single bulk transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapLayout {
    kernel: KernelId,
    transfer_size: usize,
    granularity: usize,
}

impl HeapLayout {
    pub fn new(kernel: KernelId, transfer_size: usize, granularity: usize) -> Self {
        let granularity = granularity.max(1);
        Self { kernel, transfer_size: align_up(transfer_size, granularity), granularity }
    }

    pub fn from_args(
        args: &LaunchArguments,
        granularity: usize,
    ) -> std::result::Result<Self, TransferError> {
        Ok(Self::new(KernelId::try_from(args.kernel)?, args.transfer_size as usize, granularity))
    }

    pub const fn kernel(&self) -> KernelId {
        self.kernel
    }

    pub const fn granularity(&self) -> usize {
        self.granularity
    }

    /// Byte regions of the kernel's input arrays, in transfer order.
    pub fn arrays(&self) -> Vec<Span> {
        let t = self.transfer_size;
        match self.kernel {
            KernelId::VectorAdd => vec![Span::new(0, t), Span::new(t, t)],
            KernelId::EdgeReduce => vec![Span::new(0, t)],
            // one i64 trace slot per edge record
            KernelId::EdgeScan => {
                vec![Span::new(0, t), Span::new(t, align_up(Self::trace_bytes(t), self.granularity))]
            }
        }
    }

    /// Bytes of scan trace covering `edge_bytes` bytes of edge records.
    pub const fn trace_bytes(edge_bytes: usize) -> usize {
        edge_bytes / Edge::SIZE * std::mem::size_of::<i64>()
    }

    /// Per-tasklet result slots; empty for kernels without walker state.
    ///
    /// The span may be padded past `nr_tasklets` records up to the granularity.
    pub fn results(&self, nr_tasklets: usize) -> Span {
        let offset = align_up(self.arrays().last().map_or(0, Span::end), self.granularity);
        let len = if self.kernel.is_walk() {
            align_up(nr_tasklets * TaskletResult::SIZE, self.granularity)
        } else {
            0
        };
        Span::new(offset, len)
    }

    /// One past the last byte a launch touches.
    pub fn end(&self, nr_tasklets: usize) -> usize {
        self.results(nr_tasklets).end()
    }
}
