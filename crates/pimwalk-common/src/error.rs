//! Error types for pimwalk.
//!
//! The taxonomy separates failures by the phase in which they surface:
//! allocation, program loading, transfers, capacity checks and execution.
//! Verification mismatches are not errors; they are reported as data.

use thiserror::Error;

/// Convenience result alias used across the workspace.
pub type Result<T> = std::result::Result<T, PimError>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum PimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Capacity error: {0}")]
    Capacity(#[from] CapacityError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
}

/// Accelerator allocation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("requested {requested} accelerator(s) but only {available} available")]
    Insufficient { requested: usize, available: usize },

    #[error("at least one accelerator must be requested")]
    NoneRequested,
}

/// Program image failures.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read program image: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad magic {found:02x?}, not a program image")]
    BadMagic { found: [u8; 4] },

    #[error("program image truncated: need {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("unsupported program image version {0}")]
    UnsupportedVersion(u32),

    #[error("program image has an empty kernel table")]
    EmptyKernelTable,

    #[error("kernel table slot {slot} holds unknown kernel id {id}")]
    UnknownKernel { slot: usize, id: u32 },

    #[error("kernel table slot {slot} holds {found} but the device expects {expected}")]
    KernelTableMismatch { slot: usize, expected: String, found: String },

    #[error("program built for {image} tasklet(s) but accelerators run {device}")]
    TaskletMismatch { image: u32, device: usize },

    #[error("no program loaded on accelerator {rank}")]
    NotLoaded { rank: usize },
}

/// Host/device transfer failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("transfer size {size} is not a multiple of the {granularity}-byte granularity")]
    Misaligned { size: usize, granularity: usize },

    #[error("offset {offset} is not a multiple of the {granularity}-byte granularity")]
    MisalignedOffset { offset: usize, granularity: usize },

    #[error("unknown device symbol `{0}`")]
    UnknownSymbol(String),

    #[error("symbol `{symbol}` holds {capacity} bytes, cannot access {size} bytes at offset {offset}")]
    SymbolOverflow { symbol: String, offset: usize, size: usize, capacity: usize },

    #[error("host buffer holds {actual} bytes, transfer needs {expected}")]
    HostBufferTooSmall { expected: usize, actual: usize },

    #[error("expected one record per accelerator ({expected}), got {actual}")]
    RecordCountMismatch { expected: usize, actual: usize },

    #[error("kernel id {0} is outside the dispatch table")]
    KernelOutOfRange(u32),
}

/// Static capacity violations, checked before any transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
    #[error(
        "scratch needs {required} bytes ({tasklets} tasklet(s) x {arrays} array(s) x {block_size} bytes) but holds {capacity}"
    )]
    Scratch { required: usize, capacity: usize, tasklets: usize, arrays: usize, block_size: usize },

    #[error("device memory range ends at byte {required} but capacity is {capacity}")]
    DeviceMemory { required: usize, capacity: usize },
}

/// Launch failures reported back from accelerators.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("accelerator {rank} finished with status {status}")]
    Status { rank: usize, status: i32 },

    #[error("accelerator {rank} faulted: {fault}")]
    Fault { rank: usize, fault: DeviceFault },

    #[error("accelerator {rank} was launched without a program")]
    NoProgram { rank: usize },

    #[error("accelerator {rank} could not read its launch symbols: {source}")]
    Symbols {
        rank: usize,
        #[source]
        source: TransferError,
    },
}

/// Faults raised inside a simulated accelerator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceFault {
    #[error("trap: kernel id {0} outside the dispatch table")]
    InvalidKernel(u32),

    #[error("trap: device memory access [{offset}, {end}) beyond capacity {capacity}")]
    MemoryOutOfBounds { offset: usize, end: usize, capacity: usize },

    #[error("trap: scratch exhausted, requested {requested} bytes with {remaining} left")]
    ScratchExhausted { requested: usize, remaining: usize },

    #[error("trap: unaligned scratch access of {len} bytes as {ty}")]
    UnalignedAccess { len: usize, ty: &'static str },

    #[error("trap: tasklet {tasklet} panicked")]
    TaskletPanic { tasklet: usize },
}

impl PimError {
    /// True for errors that surface before any byte reaches an accelerator.
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            PimError::Config(_) | PimError::Resource(_) | PimError::Load(_) | PimError::Capacity(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_message() {
        let err = PimError::from(ResourceError::Insufficient { requested: 8, available: 4 });
        assert_eq!(err.to_string(), "Resource error: requested 8 accelerator(s) but only 4 available");
        assert!(err.is_startup_error());
    }

    #[test]
    fn execution_error_is_not_startup() {
        let err = PimError::from(ExecutionError::Status { rank: 2, status: -1 });
        assert!(!err.is_startup_error());
        assert!(err.to_string().contains("accelerator 2"));
    }

    #[test]
    fn device_fault_wraps_into_execution() {
        let err = ExecutionError::Fault { rank: 0, fault: DeviceFault::InvalidKernel(9) };
        assert!(err.to_string().contains("kernel id 9"));
    }
}
