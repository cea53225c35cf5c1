//! A set of allocated accelerators and the host side of every transfer.
//!
//! Bulk transfers follow one convention: a host buffer holds one
//! equally-sized slot per accelerator, and accelerator `i` exchanges bytes
//! `[i * size, (i + 1) * size)` with its heap at `offset`.

use std::path::Path;

use pimwalk_common::{
    CapacityError, DeviceFault, ExecutionError, KernelId, LaunchArguments, NodeId, PimError,
    ResourceError, Result, SystemConfig, TransferError,
};
use pimwalk_device::{Accelerator, INPUT_ARGUMENTS_SYMBOL, ProgramImage, WALKER_NODE_SYMBOL};
use rayon::prelude::*;
use tracing::{debug, info};

#[derive(Debug)]
pub struct AcceleratorSet {
    accelerators: Vec<Accelerator>,
    granularity: usize,
}

impl AcceleratorSet {
    /// Allocate `count` accelerators out of `system.available_accelerators`.
    pub fn allocate(count: usize, system: &SystemConfig) -> Result<Self> {
        if count == 0 {
            return Err(ResourceError::NoneRequested.into());
        }
        if count > system.available_accelerators {
            return Err(ResourceError::Insufficient {
                requested: count,
                available: system.available_accelerators,
            }
            .into());
        }
        let accelerators = (0..count).map(|rank| Accelerator::new(rank, system)).collect();
        info!(accelerators = count, tasklets = system.tasklets, "allocated accelerators");
        Ok(Self { accelerators, granularity: system.transfer_granularity })
    }

    pub fn len(&self) -> usize {
        self.accelerators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accelerators.is_empty()
    }

    pub fn accelerators(&self) -> &[Accelerator] {
        &self.accelerators
    }

    pub fn nr_tasklets(&self) -> usize {
        self.accelerators.first().map_or(0, Accelerator::nr_tasklets)
    }

    pub fn load_program(&mut self, image: &ProgramImage) -> Result<()> {
        for acc in &mut self.accelerators {
            acc.load(image)?;
        }
        debug!(kernels = image.kernels.len(), "program loaded on every accelerator");
        Ok(())
    }

    pub fn load_program_file(&mut self, path: &Path) -> Result<()> {
        let image = ProgramImage::from_file(path)?;
        self.load_program(&image)
    }

    /// Deliver one argument record per accelerator, overwriting the last.
    ///
    /// Kernel ids are checked against the dispatch table here, so the
    /// device never sees an out-of-range id from this path.
    pub fn transfer_arguments(&mut self, args: &[LaunchArguments]) -> Result<()> {
        if args.len() != self.len() {
            return Err(TransferError::RecordCountMismatch { expected: self.len(), actual: args.len() }.into());
        }
        for record in args {
            KernelId::try_from(record.kernel)?;
        }
        for (acc, record) in self.accelerators.iter_mut().zip(args) {
            acc.write_symbol(INPUT_ARGUMENTS_SYMBOL, 0, record.as_bytes())?;
        }
        Ok(())
    }

    /// Same value of a host symbol on every accelerator.
    pub fn broadcast_symbol(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        for acc in &mut self.accelerators {
            acc.write_symbol(name, 0, bytes)?;
        }
        Ok(())
    }

    pub fn set_walker_node(&mut self, node: NodeId) -> Result<()> {
        self.broadcast_symbol(WALKER_NODE_SYMBOL, &node.to_le_bytes())
    }

    fn check_bulk(&self, buffer_len: usize, offset: usize, size: usize) -> Result<()> {
        if size % self.granularity != 0 {
            return Err(TransferError::Misaligned { size, granularity: self.granularity }.into());
        }
        if offset % self.granularity != 0 {
            return Err(TransferError::MisalignedOffset { offset, granularity: self.granularity }.into());
        }
        let expected = size * self.len();
        if buffer_len < expected {
            return Err(TransferError::HostBufferTooSmall { expected, actual: buffer_len }.into());
        }
        Ok(())
    }

    /// Copy each accelerator's `size`-byte slot of `buffer` to its heap at `offset`.
    pub fn transfer_inputs(&self, buffer: &[u8], offset: usize, size: usize) -> Result<()> {
        self.check_bulk(buffer.len(), offset, size)?;
        if size == 0 {
            return Ok(());
        }
        self.accelerators
            .par_iter()
            .zip(buffer.par_chunks(size))
            .try_for_each(|(acc, slot)| acc.memory().write(offset, slot).map_err(|f| heap_fault(acc.rank(), f)))?;
        debug!(offset, bytes = size * self.len(), "host to device");
        Ok(())
    }

    /// Launch every accelerator and wait for all of them.
    ///
    /// When several fail, the lowest rank's error is reported.
    pub fn launch(&self) -> Result<()> {
        let outcomes: Vec<_> = self.accelerators.par_iter().map(Accelerator::run).collect();
        for outcome in outcomes {
            outcome?;
        }
        Ok(())
    }

    /// Copy each accelerator's heap bytes `[offset, offset + size)` into its slot of `buffer`.
    pub fn retrieve_outputs(&self, buffer: &mut [u8], offset: usize, size: usize) -> Result<()> {
        self.check_bulk(buffer.len(), offset, size)?;
        if size == 0 {
            return Ok(());
        }
        self.accelerators
            .par_iter()
            .zip(buffer.par_chunks_mut(size))
            .try_for_each(|(acc, slot)| acc.memory().read(offset, slot).map_err(|f| heap_fault(acc.rank(), f)))?;
        debug!(offset, bytes = size * self.len(), "device to host");
        Ok(())
    }
}

/// Host-initiated heap accesses can only overrun the heap.
fn heap_fault(rank: usize, fault: DeviceFault) -> PimError {
    match fault {
        DeviceFault::MemoryOutOfBounds { end, capacity, .. } => {
            CapacityError::DeviceMemory { required: end, capacity }.into()
        }
        other => ExecutionError::Fault { rank, fault: other }.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pimwalk_common::LoadError;

    fn system() -> SystemConfig {
        SystemConfig { available_accelerators: 8, tasklets: 2, block_size: 64, ..SystemConfig::default() }
    }

    #[test]
    fn test_allocate_bounds() {
        assert!(matches!(
            AcceleratorSet::allocate(9, &system()),
            Err(PimError::Resource(ResourceError::Insufficient { requested: 9, available: 8 }))
        ));
        assert!(matches!(
            AcceleratorSet::allocate(0, &system()),
            Err(PimError::Resource(ResourceError::NoneRequested))
        ));
        assert_eq!(AcceleratorSet::allocate(8, &system()).unwrap().len(), 8);
    }

    #[test]
    fn test_load_rejects_mismatched_image() {
        let mut set = AcceleratorSet::allocate(2, &system()).unwrap();
        let err = set.load_program(&ProgramImage::for_device(4)).unwrap_err();
        assert!(matches!(err, PimError::Load(LoadError::TaskletMismatch { image: 4, device: 2 })));
    }

    #[test]
    fn test_transfer_arguments_validates() {
        let mut set = AcceleratorSet::allocate(2, &system()).unwrap();
        let good = LaunchArguments::new(8, 8, KernelId::VectorAdd);
        assert!(matches!(
            set.transfer_arguments(&[good]),
            Err(PimError::Transfer(TransferError::RecordCountMismatch { expected: 2, actual: 1 }))
        ));
        let bad = LaunchArguments { kernel: 5, ..good };
        assert!(matches!(
            set.transfer_arguments(&[good, bad]),
            Err(PimError::Transfer(TransferError::KernelOutOfRange(5)))
        ));
        set.transfer_arguments(&[good, good]).unwrap();
        assert_eq!(set.accelerators()[1].symbols().launch_arguments().unwrap(), good);
    }

    #[test]
    fn test_inputs_land_in_per_rank_slots() {
        let set = AcceleratorSet::allocate(3, &system()).unwrap();
        let buffer: Vec<u8> = (0..24).collect();
        set.transfer_inputs(&buffer, 16, 8).unwrap();

        let mut out = vec![0u8; 24];
        set.retrieve_outputs(&mut out, 16, 8).unwrap();
        assert_eq!(out, buffer);

        let mut second = [0u8; 8];
        set.accelerators()[1].memory().read(16, &mut second).unwrap();
        assert_eq!(second, [8, 9, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_retrieve_untouched_region_reads_zero() {
        let set = AcceleratorSet::allocate(2, &system()).unwrap();
        let mut out = [0xAAu8; 16];
        set.retrieve_outputs(&mut out, 64, 8).unwrap();
        assert_eq!(out, [0u8; 16]);
    }

    #[test]
    fn test_bulk_transfer_checks() {
        let set = AcceleratorSet::allocate(2, &system()).unwrap();
        assert!(matches!(
            set.transfer_inputs(&[0u8; 12], 0, 6),
            Err(PimError::Transfer(TransferError::Misaligned { size: 6, granularity: 8 }))
        ));
        assert!(matches!(
            set.transfer_inputs(&[0u8; 16], 4, 8),
            Err(PimError::Transfer(TransferError::MisalignedOffset { offset: 4, .. }))
        ));
        assert!(matches!(
            set.transfer_inputs(&[0u8; 8], 0, 8),
            Err(PimError::Transfer(TransferError::HostBufferTooSmall { expected: 16, actual: 8 }))
        ));
    }

    #[test]
    fn test_transfer_past_device_memory() {
        let small = SystemConfig { device_memory_capacity: 64, ..system() };
        let set = AcceleratorSet::allocate(1, &small).unwrap();
        assert!(matches!(
            set.transfer_inputs(&[0u8; 16], 56, 16),
            Err(PimError::Capacity(CapacityError::DeviceMemory { required: 72, capacity: 64 }))
        ));
    }
}
