//! Tasklet block pipeline.
//!
//! Every tasklet runs [`tasklet_main`]: tasklet 0 resets the scratch heap,
//! all tasklets meet at the startup barrier, then each one streams its
//! round-robin blocks of the shard through its own scratch caches and calls
//! the kernel function once per block. There is no synchronization after
//! the barrier.

use std::sync::Barrier;

use pimwalk_common::{
    BlockSchedule, DeviceFault, Edge, HeapLayout, KernelId, LaunchArguments, NodeId, Span,
    TaskletResult, WalkStatus, WalkerState,
};
use pimwalk_kernels::{add_assign_block, reduce_edges, scan_edges};
use tracing::trace;

use crate::dispatch::entry_point;
use crate::memory::DeviceMemory;
use crate::scratch::ScratchHeap;

/// Everything one tasklet can see during a launch.
pub struct TaskletContext<'a> {
    pub rank: usize,
    pub tasklet_id: usize,
    pub nr_tasklets: usize,
    pub block_size: usize,
    pub granularity: usize,
    pub args: LaunchArguments,
    pub walker_node: NodeId,
    pub memory: &'a DeviceMemory,
    pub scratch: &'a ScratchHeap,
    pub barrier: &'a Barrier,
}

impl TaskletContext<'_> {
    /// This tasklet's blocks of the occupied shard.
    pub fn blocks(&self) -> BlockSchedule {
        BlockSchedule::new(self.tasklet_id, self.nr_tasklets, self.block_size, self.args.size as usize)
    }

    fn layout(&self, kernel: KernelId) -> HeapLayout {
        HeapLayout::new(kernel, self.args.transfer_size as usize, self.granularity)
    }

    fn write_result(&self, kernel: KernelId, result: TaskletResult) -> Result<(), DeviceFault> {
        let slots = self.layout(kernel).results(self.nr_tasklets);
        let offset = slots.offset + self.tasklet_id * TaskletResult::SIZE;
        self.memory.write(offset, bytemuck::bytes_of(&result))
    }
}

/// Startup protocol followed by dispatch.
pub fn tasklet_main(ctx: &TaskletContext<'_>) -> Result<i32, DeviceFault> {
    if ctx.tasklet_id == 0 {
        ctx.scratch.reset();
    }
    ctx.barrier.wait();
    let main = entry_point(ctx.args.kernel)?;
    main(ctx)
}

/// `vec2 += vec1` over the shard.
pub fn vector_add_main(ctx: &TaskletContext<'_>) -> Result<i32, DeviceFault> {
    let transfer = ctx.layout(KernelId::VectorAdd).arrays()[1].offset;
    let mut cache_a = ctx.scratch.alloc(ctx.block_size)?;
    let mut cache_b = ctx.scratch.alloc(ctx.block_size)?;

    for block in ctx.blocks() {
        ctx.memory.read(block.offset, cache_a.bytes_mut(block.len))?;
        ctx.memory.read(transfer + block.offset, cache_b.bytes_mut(block.len))?;
        add_assign_block(cache_b.view_mut::<i32>(block.len)?, cache_a.view::<i32>(block.len)?);
        ctx.memory.write(transfer + block.offset, cache_b.bytes_mut(block.len))?;
    }
    Ok(0)
}

/// Fold the weights of edges leaving the walker node into a per-tasklet sum.
pub fn edge_reduce_main(ctx: &TaskletContext<'_>) -> Result<i32, DeviceFault> {
    let mut cache = ctx.scratch.alloc(ctx.block_size)?;
    let mut walker = WalkerState::new();
    let mut status = WalkStatus::Empty;

    for block in ctx.blocks() {
        ctx.memory.read(block.offset, cache.bytes_mut(block.len))?;
        let edges = cache.view::<Edge>(block.len)?;
        let block_status = reduce_edges(&mut walker, ctx.walker_node, edges);
        trace!(rank = ctx.rank, tasklet = ctx.tasklet_id, offset = block.offset, %block_status, "reduce block");
        status = status.merge(block_status);
    }
    ctx.write_result(KernelId::EdgeReduce, walker.result(status))?;
    Ok(0)
}

/// Like [`edge_reduce_main`], also writing the pre-update sum of every
/// matching edge into the trace region.
pub fn edge_scan_main(ctx: &TaskletContext<'_>) -> Result<i32, DeviceFault> {
    let trace_region = ctx.layout(KernelId::EdgeScan).arrays()[1];
    let mut cache = ctx.scratch.alloc(ctx.block_size)?;
    let mut trace_cache = ctx.scratch.alloc(HeapLayout::trace_bytes(ctx.block_size))?;
    let mut walker = WalkerState::new();
    let mut status = WalkStatus::Empty;

    for block in ctx.blocks() {
        let trace_block = Span::new(
            trace_region.offset + HeapLayout::trace_bytes(block.offset),
            HeapLayout::trace_bytes(block.len),
        );
        ctx.memory.read(block.offset, cache.bytes_mut(block.len))?;
        ctx.memory.read(trace_block.offset, trace_cache.bytes_mut(trace_block.len))?;

        let edges = cache.view::<Edge>(block.len)?;
        let trace = trace_cache.view_mut::<i64>(trace_block.len)?;
        let block_status = scan_edges(&mut walker, ctx.walker_node, edges, trace);
        trace!(rank = ctx.rank, tasklet = ctx.tasklet_id, offset = block.offset, %block_status, "scan block");
        status = status.merge(block_status);

        ctx.memory.write(trace_block.offset, trace_cache.bytes_mut(trace_block.len))?;
    }
    ctx.write_result(KernelId::EdgeScan, walker.result(status))?;
    Ok(0)
}
