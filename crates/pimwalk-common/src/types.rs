//! Wire records shared by host and device.
//!
//! Every record is `#[repr(C)]` + [`Pod`] so it can be moved through device
//! memory as raw bytes with `bytemuck`.

use bytemuck::{Pod, Zeroable};
use std::fmt;

use crate::kernel_registry::KernelId;

/// Graph node identifier.
pub type NodeId = u32;

/// Per-accelerator launch record, transferred before every launch.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct LaunchArguments {
    /// Bytes of the shard actually occupied on this accelerator.
    pub size: u32,
    /// Bytes per input region (the shard size rounded to transfer granularity).
    pub transfer_size: u32,
    /// Dispatch-table slot.
    pub kernel: u32,
}

impl LaunchArguments {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(size: u32, transfer_size: u32, kernel: KernelId) -> Self {
        Self { size, transfer_size, kernel: kernel.index() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Decode from the first [`Self::SIZE`] bytes; `None` if too short.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytes.get(..Self::SIZE).map(bytemuck::pod_read_unaligned)
    }
}

/// Edge kind tag stored in [`Edge::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum EdgeKind {
    Regular = 0,
    Special = 1,
}

/// A weighted directed edge.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Edge {
    pub src: NodeId,
    pub dst: NodeId,
    pub weight: i32,
    pub kind: u32,
}

impl Edge {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub const fn regular(src: NodeId, dst: NodeId, weight: i32) -> Self {
        Self { src, dst, weight, kind: EdgeKind::Regular as u32 }
    }

    /// Auxiliary edge: counted for status, never summed.
    pub const fn special(src: NodeId, dst: NodeId, weight: i32) -> Self {
        Self { src, dst, weight, kind: EdgeKind::Special as u32 }
    }

    #[inline]
    pub const fn is_special(&self) -> bool {
        self.kind == EdgeKind::Special as u32
    }
}

/// Accumulator carried by one tasklet across its blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkerState {
    pub sum: i64,
    /// Regular edges folded into `sum` so far.
    pub matched: u32,
}

impl WalkerState {
    pub const fn new() -> Self {
        Self { sum: 0, matched: 0 }
    }

    /// Snapshot written to the tasklet's result slot.
    pub const fn result(&self, status: WalkStatus) -> TaskletResult {
        TaskletResult { sum: self.sum, status: status.code(), matched: self.matched }
    }
}

/// Outcome of one edge-walk kernel call.
///
/// [`WalkStatus::code`] keeps the historical integer mapping, in which the
/// special-only case returns `edge_num` (always 0 on that path) and therefore
/// collides with [`WalkStatus::Processed`]. The enum itself keeps the cases
/// apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    /// At least one regular edge was in the block.
    Processed,
    /// No regular edges, but special edges were present.
    SpecialOnly { edge_num: u32 },
    /// The block held no edges at all.
    Empty,
}

impl WalkStatus {
    pub const EMPTY_CODE: i32 = -1;

    pub fn from_counts(edge_num: usize, special_edge_num: usize) -> Self {
        if edge_num > 0 {
            WalkStatus::Processed
        } else if special_edge_num > 0 {
            WalkStatus::SpecialOnly { edge_num: edge_num as u32 }
        } else {
            WalkStatus::Empty
        }
    }

    pub const fn code(self) -> i32 {
        match self {
            WalkStatus::Processed => 0,
            WalkStatus::SpecialOnly { edge_num } => edge_num as i32,
            WalkStatus::Empty => Self::EMPTY_CODE,
        }
    }

    /// "Nothing to do for this block"; not an error.
    pub const fn is_empty(self) -> bool {
        matches!(self, WalkStatus::Empty)
    }

    /// Combine statuses over several blocks, keeping the strongest outcome.
    #[must_use]
    pub fn merge(self, other: WalkStatus) -> WalkStatus {
        match (self, other) {
            (WalkStatus::Processed, _) | (_, WalkStatus::Processed) => WalkStatus::Processed,
            (s @ WalkStatus::SpecialOnly { .. }, _) | (_, s @ WalkStatus::SpecialOnly { .. }) => s,
            _ => WalkStatus::Empty,
        }
    }
}

impl fmt::Display for WalkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkStatus::Processed => write!(f, "processed"),
            WalkStatus::SpecialOnly { .. } => write!(f, "special-only"),
            WalkStatus::Empty => write!(f, "empty"),
        }
    }
}

/// Final walker state of one tasklet, written to its result slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct TaskletResult {
    pub sum: i64,
    /// [`WalkStatus::code`] merged over all blocks of the tasklet.
    pub status: i32,
    /// Regular edges whose source matched the walker's node.
    pub matched: u32,
}

impl TaskletResult {
    pub const SIZE: usize = std::mem::size_of::<Self>();
}
