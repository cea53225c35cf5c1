//! Kernel id registry: the closed set of device entry points.
//!
//! The numeric value of each [`KernelId`] is its slot in the device dispatch
//! table and is what travels in [`crate::LaunchArguments::kernel`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TransferError;

/// Number of slots in the device dispatch table.
pub const NR_KERNELS: usize = 3;

/// A device kernel, identified by its dispatch-table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u32)]
pub enum KernelId {
    /// `result[i] += operand[i]` over two same-length int32 arrays.
    VectorAdd = 0,
    /// Sum edge weights leaving the walker's node.
    EdgeReduce = 1,
    /// Running-sum trace over edges leaving the walker's node.
    EdgeScan = 2,
}

impl KernelId {
    /// All kernels in dispatch-table order.
    pub const ALL: [KernelId; NR_KERNELS] =
        [KernelId::VectorAdd, KernelId::EdgeReduce, KernelId::EdgeScan];

    /// Dispatch-table slot.
    #[inline]
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Stable kebab-case name.
    pub const fn name(self) -> &'static str {
        match self {
            KernelId::VectorAdd => "vector-add",
            KernelId::EdgeReduce => "edge-reduce",
            KernelId::EdgeScan => "edge-scan",
        }
    }

    /// How many arrays one tasklet keeps resident in scratch per block.
    pub const fn resident_arrays(self) -> usize {
        match self {
            KernelId::VectorAdd => 2,
            KernelId::EdgeReduce => 1,
            KernelId::EdgeScan => 2,
        }
    }

    /// Whether the kernel carries walker state across blocks.
    pub const fn is_walk(self) -> bool {
        matches!(self, KernelId::EdgeReduce | KernelId::EdgeScan)
    }
}

impl TryFrom<u32> for KernelId {
    type Error = TransferError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        KernelId::ALL.get(value as usize).copied().ok_or(TransferError::KernelOutOfRange(value))
    }
}

impl fmt::Display for KernelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for KernelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "vector-add" | "va" => Ok(KernelId::VectorAdd),
            "edge-reduce" | "red" => Ok(KernelId::EdgeReduce),
            "edge-scan" | "scan" => Ok(KernelId::EdgeScan),
            other => Err(format!("unknown kernel: {other}")),
        }
    }
}
