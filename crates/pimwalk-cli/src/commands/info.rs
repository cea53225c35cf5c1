//! `info`: effective configuration summary and dispatch table.

use console::style;
use pimwalk_common::{Edge, EntitySchema, PimConfig, TaskletResult};
use pimwalk_device::{HEAP_SYMBOL, HostSymbols, KERNEL_TABLE};

pub fn show_info(config: &PimConfig) {
    let sys = &config.system;
    let run = &config.run;

    println!("{}", style("pimwalk").bold().cyan());
    println!("  version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("{}", style("System:").bold());
    println!("  accelerators:      {} of {}", sys.accelerators, sys.available_accelerators);
    println!("  tasklets:          {}", sys.tasklets);
    println!("  block size:        {} bytes", sys.block_size);
    println!("  scratch:           {} bytes", sys.scratch_capacity);
    println!("  device memory:     {} bytes", sys.device_memory_capacity);
    println!("  transfer granule:  {} bytes", sys.transfer_granularity);
    println!();

    println!("{}", style("Run:").bold());
    println!("  kernel:   {}", run.kernel);
    println!("  elements: {} ({} scaling)", run.total_size(sys.accelerators), run.scaling);
    println!("  rounds:   {} warm-up + {} timed", run.warmup, run.reps);
    println!();

    println!("{}", style("Dispatch table:").bold());
    for kernel in KERNEL_TABLE {
        let scratch = sys.scratch_requirement(kernel);
        let fits = if scratch <= sys.scratch_capacity { style("fits").green() } else { style("over").red() };
        println!("  [{}] {:<12} scratch {:>6} bytes ({fits})", kernel.index(), kernel.name(), scratch);
    }
    println!();

    println!("{}", style("Host symbols:").bold());
    let symbols = HostSymbols::default();
    for name in symbols.names() {
        println!("  {name:<22} {} bytes", symbols.size_of(name).unwrap_or_default());
    }
    println!("  {HEAP_SYMBOL:<22} heap base");
    println!();

    println!("{}", style("Records:").bold());
    let records = [EntitySchema::vector_pair(1), EntitySchema::edge(), EntitySchema::tasklet_result()];
    for schema in &records {
        println!("  {schema}");
    }
    debug_assert_eq!(records[1].size_bytes(), Edge::SIZE);
    debug_assert_eq!(records[2].size_bytes(), TaskletResult::SIZE);
}
