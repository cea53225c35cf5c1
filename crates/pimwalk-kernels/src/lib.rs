//! Kernel functions for pimwalk
//!
//! The device-side functions here only see cached block data: they know
//! nothing about shards, tasklets or transfers. The [`reference`] module
//! runs the same logic over a whole dataset on the host for verification.

pub mod edge_walk;
pub mod elementwise;
pub mod reference;

pub use edge_walk::{reduce_edges, scan_edges};
pub use elementwise::{KERNEL_OK, add_assign_block};
