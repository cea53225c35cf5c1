//! Workloads: what a kernel needs from the host each round.
//!
//! The orchestrator owns the round structure; a [`Workload`] only knows
//! how to lay its data out, compute its reference, and compare.

mod edge_walk;
mod vector_add;

pub use edge_walk::{AcceleratorWalk, EdgeWalkWorkload, WalkSummary};
pub use vector_add::VectorAddWorkload;

use pimwalk_common::{EntitySchema, KernelId, NodeId, Result, RunConfig, SystemConfig};

use crate::accelerator_set::AcceleratorSet;
use crate::dataset::{EdgeSpec, VectorPair, generate_edges};
use crate::plan::LaunchPlan;
use crate::verify::VerificationReport;

pub trait Workload: Send {
    fn kernel(&self) -> KernelId;

    /// Byte width of one dataset element.
    fn element_size(&self) -> usize;

    /// Dataset elements to partition.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node broadcast to the walker symbol, for kernels that walk edges.
    fn walker_node(&self) -> Option<NodeId> {
        None
    }

    /// Host reference for this round.
    fn host_compute(&mut self, plan: &LaunchPlan, system: &SystemConfig);

    /// Copy every input array into the accelerators' heaps.
    fn push_inputs(&self, set: &AcceleratorSet, plan: &LaunchPlan) -> Result<()>;

    fn pull_outputs(&mut self, set: &AcceleratorSet, plan: &LaunchPlan) -> Result<()>;

    fn verify(&self) -> VerificationReport;

    fn walk_summary(&self) -> Option<WalkSummary> {
        None
    }
}

/// Generate the dataset `run` describes for `accelerators` accelerators.
pub fn build_workload(run: &RunConfig, accelerators: usize) -> Result<Box<dyn Workload>> {
    let total = run.total_size(accelerators);
    let workload: Box<dyn Workload> = match run.kernel {
        KernelId::VectorAdd => {
            let schema = EntitySchema::vector_pair(total);
            let data = VectorPair::generate(&schema, run.seed)?;
            Box::new(VectorAddWorkload::new(schema, data)?)
        }
        kernel @ (KernelId::EdgeReduce | KernelId::EdgeScan) => {
            let edges = generate_edges(&EdgeSpec {
                len: total,
                nodes: run.graph_nodes,
                special_ratio: run.special_edge_ratio,
                seed: run.seed,
            });
            Box::new(EdgeWalkWorkload::new(kernel, edges, run.walker_node))
        }
    };
    Ok(workload)
}
