//! Common types, errors and layout math for pimwalk
//!
//! This crate holds everything host and device agree on: the wire records,
//! the kernel registry, the run configuration and the shard/block
//! partitioning arithmetic.

pub mod config;
pub mod error;
pub mod kernel_registry;
pub mod layout;
pub mod math;
pub mod schema;
pub mod types;

pub use config::{ConfigError, LogFormat, PimConfig, RunConfig, Scaling, SystemConfig};
pub use error::*;
pub use kernel_registry::{KernelId, NR_KERNELS};
pub use layout::{BlockSchedule, Blocks, HeapLayout, ShardPlan, Span, partition};
pub use math::{align_up, ceil_div};
pub use schema::{BaseType, EntitySchema, Field, FieldType};
pub use types::*;
