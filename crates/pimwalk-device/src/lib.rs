//! Simulated processing-in-memory accelerator for pimwalk
//!
//! Each [`Accelerator`] owns a device-memory heap, a shared scratch heap and
//! a few host symbols, and runs its tasklets as scoped threads. Nothing here
//! knows about more than one accelerator; that is the host's job.

pub mod accelerator;
pub mod dispatch;
pub mod memory;
pub mod pipeline;
pub mod program;
pub mod scratch;

pub use accelerator::Accelerator;
pub use dispatch::{EntryPoint, KERNEL_TABLE, KERNELS, entry_point};
pub use memory::{DeviceMemory, HEAP_SYMBOL, HostSymbols, INPUT_ARGUMENTS_SYMBOL, WALKER_NODE_SYMBOL};
pub use pipeline::{TaskletContext, tasklet_main};
pub use program::ProgramImage;
pub use scratch::{ScratchBuffer, ScratchHeap};
