//! `run`: execute the configured rounds and verify the result.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use pimwalk_common::{KernelId, PimConfig, Scaling};
use pimwalk_device::ProgramImage;
use pimwalk_host::{Orchestrator, RunReport, build_workload};
use tracing::info;

use crate::exit::{EXIT_SUCCESS, EXIT_VERIFICATION_FAILED};

#[derive(Args, Debug, Default)]
pub struct RunCommand {
    /// Kernel to run (vector-add, edge-reduce, edge-scan)
    #[arg(short, long, value_name = "KERNEL")]
    pub kernel: Option<KernelId>,

    /// Accelerators to allocate
    #[arg(short, long, value_name = "N")]
    pub accelerators: Option<usize>,

    /// Tasklets per accelerator
    #[arg(short, long, value_name = "N")]
    pub tasklets: Option<usize>,

    /// Bytes per streamed block
    #[arg(long, value_name = "BYTES")]
    pub block_size: Option<usize>,

    /// Dataset elements (per accelerator with weak scaling)
    #[arg(short = 'n', long, value_name = "N")]
    pub input_size: Option<usize>,

    /// strong or weak
    #[arg(long, value_name = "MODE")]
    pub scaling: Option<Scaling>,

    /// Untimed warm-up rounds
    #[arg(short, long, value_name = "N")]
    pub warmup: Option<usize>,

    /// Timed rounds
    #[arg(short, long, value_name = "N")]
    pub reps: Option<usize>,

    /// Input generator seed
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Program image to load instead of the built-in dispatch table
    #[arg(long, value_name = "PATH")]
    pub binary: Option<PathBuf>,
}

impl RunCommand {
    /// Layer the flags over `config` and re-validate.
    pub fn apply(&self, config: &PimConfig) -> Result<PimConfig> {
        let mut cfg = config.clone();
        if let Some(kernel) = self.kernel {
            cfg.run.kernel = kernel;
        }
        if let Some(n) = self.accelerators {
            cfg.system.accelerators = n;
        }
        if let Some(n) = self.tasklets {
            cfg.system.tasklets = n;
        }
        if let Some(n) = self.block_size {
            cfg.system.block_size = n;
        }
        if let Some(n) = self.input_size {
            cfg.run.input_size = n;
        }
        if let Some(mode) = self.scaling {
            cfg.run.scaling = mode;
        }
        if let Some(n) = self.warmup {
            cfg.run.warmup = n;
        }
        if let Some(n) = self.reps {
            cfg.run.reps = n;
        }
        if let Some(seed) = self.seed {
            cfg.run.seed = seed;
        }
        cfg.validate().context("Invalid run configuration")?;
        Ok(cfg)
    }

    fn program(&self, config: &PimConfig) -> Result<ProgramImage> {
        match &self.binary {
            Some(path) => ProgramImage::from_file(path)
                .with_context(|| format!("Failed to load program image {}", path.display())),
            None => Ok(ProgramImage::for_device(config.system.tasklets)),
        }
    }

    /// Returns the process exit code; fatal errors come back as `Err`.
    pub fn execute(&self, config: &PimConfig) -> Result<i32> {
        let config = self.apply(config)?;
        let report = self.run(&config)?;
        Ok(print_report(&report))
    }

    pub fn run(&self, config: &PimConfig) -> Result<RunReport> {
        let image = self.program(config)?;
        let mut orchestrator =
            Orchestrator::new(config.system.clone(), &image).context("Failed to prepare accelerators")?;
        let mut workload = build_workload(&config.run, config.system.accelerators)?;
        info!(kernel = %config.run.kernel, elements = workload.len(), "dataset ready");
        let report = orchestrator
            .run(workload.as_mut(), config.run.warmup, config.run.reps)
            .with_context(|| format!("{} run failed", config.run.kernel))?;
        Ok(report)
    }
}

/// Print `report` and return the exit code it maps to.
pub fn print_report(report: &RunReport) -> i32 {
    println!(
        "{} {} on {} accelerator(s) x {} tasklet(s), {} element(s)",
        style("Kernel").bold(),
        report.kernel,
        report.accelerators,
        report.tasklets,
        report.elements
    );
    println!("{}", report.timing);
    if let Some(walk) = &report.walk {
        print!("{walk}");
    }
    if report.passed() {
        println!("[{}] {}", style("OK").green().bold(), report.verification);
        EXIT_SUCCESS
    } else {
        println!("[{}] {}", style("ERROR").red().bold(), report.verification);
        EXIT_VERIFICATION_FAILED
    }
}
