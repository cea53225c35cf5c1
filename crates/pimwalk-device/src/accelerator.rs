//! One simulated accelerator.

use std::sync::Barrier;
use std::thread;

use pimwalk_common::{DeviceFault, ExecutionError, LoadError, SystemConfig, TransferError};
use tracing::{debug, trace};

use crate::memory::{DeviceMemory, HostSymbols};
use crate::pipeline::{TaskletContext, tasklet_main};
use crate::program::ProgramImage;
use crate::scratch::ScratchHeap;

#[derive(Debug)]
pub struct Accelerator {
    rank: usize,
    nr_tasklets: usize,
    block_size: usize,
    granularity: usize,
    memory: DeviceMemory,
    scratch: ScratchHeap,
    symbols: HostSymbols,
    program: Option<ProgramImage>,
}

impl Accelerator {
    pub fn new(rank: usize, system: &SystemConfig) -> Self {
        Self {
            rank,
            nr_tasklets: system.tasklets,
            block_size: system.block_size,
            granularity: system.transfer_granularity,
            memory: DeviceMemory::new(system.device_memory_capacity),
            scratch: ScratchHeap::new(system.scratch_capacity),
            symbols: HostSymbols::default(),
            program: None,
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn nr_tasklets(&self) -> usize {
        self.nr_tasklets
    }

    /// Alignment of every heap region the host transfers.
    pub fn granularity(&self) -> usize {
        self.granularity
    }

    pub fn memory(&self) -> &DeviceMemory {
        &self.memory
    }

    pub fn symbols(&self) -> &HostSymbols {
        &self.symbols
    }

    pub fn program(&self) -> Option<&ProgramImage> {
        self.program.as_ref()
    }

    pub fn load(&mut self, image: &ProgramImage) -> Result<(), LoadError> {
        image.check_compatible(self.nr_tasklets)?;
        self.program = Some(image.clone());
        self.memory.clear();
        debug!(rank = self.rank, tasklets = self.nr_tasklets, "program loaded");
        Ok(())
    }

    pub fn write_symbol(&mut self, name: &str, offset: usize, bytes: &[u8]) -> Result<(), TransferError> {
        self.symbols.write(name, offset, bytes)
    }

    /// Run one kernel pass on every tasklet and wait for all of them.
    ///
    /// The first fault wins; otherwise any non-zero tasklet status fails the
    /// launch.
    pub fn run(&self) -> Result<(), ExecutionError> {
        let rank = self.rank;
        if self.program.is_none() {
            return Err(ExecutionError::NoProgram { rank });
        }
        let symbols_err = |source| ExecutionError::Symbols { rank, source };
        let args = self.symbols.launch_arguments().map_err(symbols_err)?;
        let walker_node = self.symbols.walker_node().map_err(symbols_err)?;
        let barrier = Barrier::new(self.nr_tasklets);
        trace!(rank, size = args.size, transfer_size = args.transfer_size, kernel = args.kernel, "launch");

        let outcomes: Vec<Result<i32, DeviceFault>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..self.nr_tasklets)
                .map(|tasklet_id| {
                    let ctx = TaskletContext {
                        rank,
                        tasklet_id,
                        nr_tasklets: self.nr_tasklets,
                        block_size: self.block_size,
                        granularity: self.granularity,
                        args,
                        walker_node,
                        memory: &self.memory,
                        scratch: &self.scratch,
                        barrier: &barrier,
                    };
                    scope.spawn(move || tasklet_main(&ctx))
                })
                .collect();
            handles
                .into_iter()
                .enumerate()
                .map(|(tasklet, handle)| {
                    handle.join().unwrap_or(Err(DeviceFault::TaskletPanic { tasklet }))
                })
                .collect()
        });

        let mut failed_status = None;
        for outcome in outcomes {
            match outcome {
                Err(fault) => return Err(ExecutionError::Fault { rank, fault }),
                Ok(0) => {}
                Ok(status) => failed_status = failed_status.or(Some(status)),
            }
        }
        match failed_status {
            Some(status) => Err(ExecutionError::Status { rank, status }),
            None => Ok(()),
        }
    }
}
