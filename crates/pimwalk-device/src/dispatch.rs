//! Device kernel dispatch table.
//!
//! Entry points are enumerated at build time; a launch picks one by the
//! `kernel` field of its [`pimwalk_common::LaunchArguments`].

use pimwalk_common::{DeviceFault, KernelId, NR_KERNELS};

use crate::pipeline::{self, TaskletContext};

/// A device entry point, run by every tasklet of a launch.
pub type EntryPoint = fn(&TaskletContext<'_>) -> Result<i32, DeviceFault>;

/// Kernel ids in slot order; must line up with [`KERNELS`].
pub const KERNEL_TABLE: [KernelId; NR_KERNELS] = KernelId::ALL;

pub static KERNELS: [EntryPoint; NR_KERNELS] =
    [pipeline::vector_add_main, pipeline::edge_reduce_main, pipeline::edge_scan_main];

/// Resolve a slot; anything past the table traps.
pub fn entry_point(kernel: u32) -> Result<EntryPoint, DeviceFault> {
    KERNELS.get(kernel as usize).copied().ok_or(DeviceFault::InvalidKernel(kernel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_every_kernel() {
        for kernel in KernelId::ALL {
            assert!(entry_point(kernel.index()).is_ok());
            assert_eq!(KERNEL_TABLE[kernel.index() as usize], kernel);
        }
    }

    #[test]
    fn test_out_of_range_traps() {
        assert_eq!(entry_point(NR_KERNELS as u32).err(), Some(DeviceFault::InvalidKernel(3)));
    }
}
