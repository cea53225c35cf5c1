//! Host-side orchestration for pimwalk
//!
//! Allocates a set of accelerators, partitions a dataset across them,
//! drives the transfer/launch/retrieve rounds and checks the device output
//! against the host reference kernels.

pub mod accelerator_set;
pub mod dataset;
pub mod orchestrator;
pub mod plan;
pub mod timer;
pub mod verify;
pub mod workload;

pub use accelerator_set::AcceleratorSet;
pub use dataset::{EdgeSpec, VectorPair, generate_edges};
pub use orchestrator::{Orchestrator, RunReport};
pub use plan::LaunchPlan;
pub use timer::{Phase, RoundTimer, TimingReport};
pub use verify::{VerificationReport, verify};
pub use workload::{
    AcceleratorWalk, EdgeWalkWorkload, VectorAddWorkload, WalkSummary, Workload, build_workload,
};
