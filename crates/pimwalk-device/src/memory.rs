//! Device memory and host-visible symbols.
//!
//! [`DeviceMemory`] is the large per-accelerator heap. Its mutex stands in
//! for the single DMA engine: every block transfer between heap and scratch
//! is serialized through it. [`HostSymbols`] are the small named variables
//! the host writes before a launch.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use pimwalk_common::{DeviceFault, LaunchArguments, NodeId, TransferError};

/// Launch arguments of the current round.
pub const INPUT_ARGUMENTS_SYMBOL: &str = "DPU_INPUT_ARGUMENTS";
/// Node the edge-walk kernels compare sources against.
pub const WALKER_NODE_SYMBOL: &str = "DPU_WALKER_NODE";
/// Start of the device heap; offsets of heap transfers are relative to it.
pub const HEAP_SYMBOL: &str = "__sys_used_mram_end";

/// Byte-addressed device heap, grown on first touch up to `capacity`.
#[derive(Debug)]
pub struct DeviceMemory {
    bytes: Mutex<Vec<u8>>,
    capacity: usize,
}

impl DeviceMemory {
    pub fn new(capacity: usize) -> Self {
        Self { bytes: Mutex::new(Vec::new()), capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes backed so far.
    pub fn resident(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        match self.bytes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check(&self, offset: usize, len: usize) -> Result<usize, DeviceFault> {
        let end = offset.checked_add(len).unwrap_or(usize::MAX);
        if end > self.capacity {
            return Err(DeviceFault::MemoryOutOfBounds { offset, end, capacity: self.capacity });
        }
        Ok(end)
    }

    /// Copy `src` into the heap at `offset`.
    pub fn write(&self, offset: usize, src: &[u8]) -> Result<(), DeviceFault> {
        let end = self.check(offset, src.len())?;
        let mut bytes = self.lock();
        if bytes.len() < end {
            bytes.resize(end, 0);
        }
        bytes[offset..end].copy_from_slice(src);
        Ok(())
    }

    /// Fill `dst` from the heap at `offset`; untouched bytes read as zero.
    pub fn read(&self, offset: usize, dst: &mut [u8]) -> Result<(), DeviceFault> {
        let end = self.check(offset, dst.len())?;
        let bytes = self.lock();
        let start = offset.min(bytes.len());
        let stop = end.min(bytes.len()).max(start);
        let (head, tail) = dst.split_at_mut(stop - start);
        head.copy_from_slice(&bytes[start..stop]);
        tail.fill(0);
        Ok(())
    }

    /// Release the backing store.
    pub fn clear(&self) {
        let mut bytes = self.lock();
        bytes.clear();
        bytes.shrink_to_fit();
    }
}

/// Fixed set of named host variables.
#[derive(Debug, Clone)]
pub struct HostSymbols {
    slots: BTreeMap<&'static str, Vec<u8>>,
}

impl Default for HostSymbols {
    fn default() -> Self {
        let mut slots = BTreeMap::new();
        slots.insert(INPUT_ARGUMENTS_SYMBOL, vec![0; LaunchArguments::SIZE]);
        slots.insert(WALKER_NODE_SYMBOL, vec![0; std::mem::size_of::<NodeId>()]);
        Self { slots }
    }
}

impl HostSymbols {
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.keys().copied()
    }

    pub fn size_of(&self, name: &str) -> Option<usize> {
        self.slots.get(name).map(Vec::len)
    }

    pub fn write(&mut self, name: &str, offset: usize, src: &[u8]) -> Result<(), TransferError> {
        let slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| TransferError::UnknownSymbol(name.to_string()))?;
        let capacity = slot.len();
        match offset.checked_add(src.len()) {
            Some(end) if end <= capacity => {
                slot[offset..end].copy_from_slice(src);
                Ok(())
            }
            _ => Err(TransferError::SymbolOverflow {
                symbol: name.to_string(),
                offset,
                size: src.len(),
                capacity,
            }),
        }
    }

    pub fn read(&self, name: &str) -> Result<&[u8], TransferError> {
        self.slots
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| TransferError::UnknownSymbol(name.to_string()))
    }

    pub fn launch_arguments(&self) -> Result<LaunchArguments, TransferError> {
        let bytes = self.read(INPUT_ARGUMENTS_SYMBOL)?;
        LaunchArguments::from_bytes(bytes).ok_or(TransferError::HostBufferTooSmall {
            expected: LaunchArguments::SIZE,
            actual: bytes.len(),
        })
    }

    pub fn walker_node(&self) -> Result<NodeId, TransferError> {
        let bytes = self.read(WALKER_NODE_SYMBOL)?;
        let word: [u8; 4] = bytes.try_into().map_err(|_| TransferError::HostBufferTooSmall {
            expected: std::mem::size_of::<NodeId>(),
            actual: bytes.len(),
        })?;
        Ok(NodeId::from_le_bytes(word))
    }
}
