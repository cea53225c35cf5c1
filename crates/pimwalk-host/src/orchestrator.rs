//! Round loop: partition once, then per round compute the host reference,
//! push arguments and inputs, launch, and pull outputs back.

use pimwalk_common::{KernelId, Result, ShardPlan, SystemConfig};
use pimwalk_device::ProgramImage;
use tracing::{debug, info, warn};

use crate::accelerator_set::AcceleratorSet;
use crate::plan::LaunchPlan;
use crate::timer::{Phase, RoundTimer, TimingReport};
use crate::verify::VerificationReport;
use crate::workload::{WalkSummary, Workload};

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub kernel: KernelId,
    pub accelerators: usize,
    pub tasklets: usize,
    pub elements: usize,
    pub timing: TimingReport,
    pub verification: VerificationReport,
    pub walk: Option<WalkSummary>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.verification.passed()
    }
}

#[derive(Debug)]
pub struct Orchestrator {
    system: SystemConfig,
    set: AcceleratorSet,
}

impl Orchestrator {
    /// Allocate `system.accelerators` accelerators and load `image` on all of them.
    pub fn new(system: SystemConfig, image: &ProgramImage) -> Result<Self> {
        let mut set = AcceleratorSet::allocate(system.accelerators, &system)?;
        set.load_program(image)?;
        Ok(Self { system, set })
    }

    pub fn set(&self) -> &AcceleratorSet {
        &self.set
    }

    pub fn system(&self) -> &SystemConfig {
        &self.system
    }

    /// Run `warmup + reps` rounds of `workload`; only the last `reps` are timed.
    ///
    /// Every static check (scratch, device memory, empty dataset) happens
    /// before the first transfer.
    pub fn run(&mut self, workload: &mut dyn Workload, warmup: usize, reps: usize) -> Result<RunReport> {
        let kernel = workload.kernel();
        self.system.check_scratch(kernel)?;
        let shards = ShardPlan::new(workload.len(), self.set.len())?;
        let plan = LaunchPlan::new(shards, kernel, workload.element_size(), self.system.transfer_granularity)?;
        plan.check_device_memory(self.system.tasklets, self.system.device_memory_capacity)?;
        let args = plan.arguments();
        info!(
            %kernel,
            elements = workload.len(),
            accelerators = self.set.len(),
            shard_len = shards.shard_len(),
            transfer_size = plan.transfer_size(),
            "starting run"
        );

        let mut timer = RoundTimer::new(warmup);
        for round in 0..warmup + reps {
            timer.begin_round(round);
            debug!(round, warmup = timer.is_warmup(), "round");

            timer.measure(Phase::HostCompute, || workload.host_compute(&plan, &self.system));

            timer.measure(Phase::HostToDevice, || -> Result<()> {
                self.set.transfer_arguments(&args)?;
                if let Some(node) = workload.walker_node() {
                    self.set.set_walker_node(node)?;
                }
                workload.push_inputs(&self.set, &plan)
            })?;

            timer.measure(Phase::DeviceExecution, || self.set.launch())?;

            timer.measure(Phase::DeviceToHost, || workload.pull_outputs(&self.set, &plan))?;
        }

        let verification = workload.verify();
        if verification.passed() {
            info!(%verification, "outputs verified");
        } else {
            warn!(%verification, "outputs differ from host reference");
        }

        Ok(RunReport {
            kernel,
            accelerators: self.set.len(),
            tasklets: self.system.tasklets,
            elements: workload.len(),
            timing: timer.report(reps),
            verification,
            walk: workload.walk_summary(),
        })
    }
}
