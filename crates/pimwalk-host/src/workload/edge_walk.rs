use std::fmt;

use pimwalk_common::{
    Edge, KernelId, NodeId, Result, SystemConfig, TaskletResult, WalkStatus, WalkerState,
};
use pimwalk_kernels::reference;
use tracing::debug;

use crate::accelerator_set::AcceleratorSet;
use crate::plan::LaunchPlan;
use crate::verify::{VerificationReport, verify};
use crate::workload::Workload;

/// Walker state of one accelerator, combined over its tasklets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceleratorWalk {
    pub rank: usize,
    pub sum: i64,
    pub matched: u32,
    /// [`WalkStatus::code`] merged over the tasklets: `-1` when no tasklet
    /// saw an edge.
    pub status: i32,
}

impl AcceleratorWalk {
    fn combine(rank: usize, tasklets: &[TaskletResult]) -> Self {
        let sum = tasklets.iter().fold(0i64, |acc, r| acc.wrapping_add(r.sum));
        let matched = tasklets.iter().map(|r| r.matched).sum();
        // codes only distinguish "no edges" from the rest
        let status = tasklets
            .iter()
            .map(|r| r.status)
            .find(|&code| code != WalkStatus::EMPTY_CODE)
            .unwrap_or(WalkStatus::EMPTY_CODE);
        Self { rank, sum, matched, status }
    }
}

/// Per-accelerator walk statistics of the last round.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WalkSummary {
    pub node: NodeId,
    pub accelerators: Vec<AcceleratorWalk>,
}

impl WalkSummary {
    pub fn total_sum(&self) -> i64 {
        self.accelerators.iter().fold(0i64, |acc, a| acc.wrapping_add(a.sum))
    }

    pub fn total_matched(&self) -> u64 {
        self.accelerators.iter().map(|a| u64::from(a.matched)).sum()
    }
}

impl fmt::Display for WalkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "node {}: sum {} over {} edge(s)", self.node, self.total_sum(), self.total_matched())?;
        for acc in &self.accelerators {
            writeln!(f, "  accelerator {:>3}: sum {:>12} matched {:>8} status {}", acc.rank, acc.sum, acc.matched, acc.status)?;
        }
        Ok(())
    }
}

/// Edge reduce or edge scan over a partitioned edge list.
#[derive(Debug, Clone)]
pub struct EdgeWalkWorkload {
    kernel: KernelId,
    edges: Vec<Edge>,
    node: NodeId,
    expected_shards: Vec<(WalkerState, WalkStatus)>,
    expected_trace: Vec<i64>,
    summary: WalkSummary,
    trace: Vec<i64>,
}

impl EdgeWalkWorkload {
    pub fn new(kernel: KernelId, edges: Vec<Edge>, node: NodeId) -> Self {
        debug_assert!(kernel.is_walk());
        Self {
            kernel,
            edges,
            node,
            expected_shards: Vec::new(),
            expected_trace: Vec::new(),
            summary: WalkSummary { node, accelerators: Vec::new() },
            trace: Vec::new(),
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Device trace of the last round (edge-scan only).
    pub fn trace(&self) -> &[i64] {
        &self.trace
    }

    pub fn expected_trace(&self) -> &[i64] {
        &self.expected_trace
    }

    fn is_scan(&self) -> bool {
        self.kernel == KernelId::EdgeScan
    }
}

impl Workload for EdgeWalkWorkload {
    fn kernel(&self) -> KernelId {
        self.kernel
    }

    fn element_size(&self) -> usize {
        Edge::SIZE
    }

    fn len(&self) -> usize {
        self.edges.len()
    }

    fn walker_node(&self) -> Option<NodeId> {
        Some(self.node)
    }

    fn host_compute(&mut self, plan: &LaunchPlan, system: &SystemConfig) {
        self.expected_shards = plan
            .shards()
            .shards()
            .map(|shard| reference::edge_reduce(&self.edges[shard.range()], self.node))
            .collect();
        if self.is_scan() {
            self.expected_trace =
                reference::edge_scan(&self.edges, self.node, plan.shards(), system.tasklets, system.block_size);
        }
    }

    fn push_inputs(&self, set: &AcceleratorSet, plan: &LaunchPlan) -> Result<()> {
        let regions = plan.heap_layout().arrays();
        let padded = plan.scatter(&self.edges);
        set.transfer_inputs(bytemuck::cast_slice(&padded), regions[0].offset, regions[0].len)?;
        if let Some(trace_region) = regions.get(1) {
            let zeros = vec![0u8; trace_region.len * plan.count()];
            set.transfer_inputs(&zeros, trace_region.offset, trace_region.len)?;
        }
        Ok(())
    }

    fn pull_outputs(&mut self, set: &AcceleratorSet, plan: &LaunchPlan) -> Result<()> {
        let layout = plan.heap_layout();
        let nr_tasklets = set.nr_tasklets();
        let slots = layout.results(nr_tasklets);
        let mut bytes = vec![0u8; slots.len * set.len()];
        set.retrieve_outputs(&mut bytes, slots.offset, slots.len)?;
        let records = nr_tasklets * TaskletResult::SIZE;
        self.summary.accelerators = bytes
            .chunks(slots.len.max(1))
            .enumerate()
            .map(|(rank, slot)| {
                let tasklets: Vec<TaskletResult> = bytemuck::pod_collect_to_vec(&slot[..records]);
                AcceleratorWalk::combine(rank, &tasklets)
            })
            .collect();
        for acc in &self.summary.accelerators {
            debug!(rank = acc.rank, sum = acc.sum, matched = acc.matched, status = acc.status, "walk result");
        }

        if let Some(trace_region) = layout.arrays().get(1) {
            let slot = trace_region.len / std::mem::size_of::<i64>();
            let mut padded = vec![0i64; slot * plan.count()];
            set.retrieve_outputs(bytemuck::cast_slice_mut(&mut padded), trace_region.offset, trace_region.len)?;
            self.trace = plan.gather_slots(&padded, slot);
        }
        Ok(())
    }

    fn verify(&self) -> VerificationReport {
        let expected: Vec<(i64, u32, i32)> = self
            .expected_shards
            .iter()
            .map(|(w, status)| (w.sum, w.matched, status.code()))
            .collect();
        let actual: Vec<(i64, u32, i32)> =
            self.summary.accelerators.iter().map(|a| (a.sum, a.matched, a.status)).collect();
        let sums = verify(&expected, &actual);
        if self.is_scan() { sums.and(verify(&self.expected_trace, &self.trace)) } else { sums }
    }

    fn walk_summary(&self) -> Option<WalkSummary> {
        Some(self.summary.clone())
    }
}
