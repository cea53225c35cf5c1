//! pimwalk CLI
//!
//! Runs vector and edge-walk kernels over a set of simulated
//! processing-in-memory accelerators and checks them against the host.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pimwalk_cli::commands::{ConfigAction, ImageCommand, RunCommand, config::handle_config_command};
use pimwalk_cli::exit::{EXIT_FAILURE, EXIT_SUCCESS};
use pimwalk_cli::{load_configuration, logging::setup_logging};
use pimwalk_common::config::LoggingConfig;
use tracing::error;

#[derive(Parser)]
#[command(name = "pimwalk")]
#[command(about = "Two-level partitioned kernels on simulated PIM accelerators")]
#[command(long_about = r#"
pimwalk partitions a dataset across accelerators, streams each shard through
the tasklets of its accelerator in fixed-size blocks, and verifies the device
output against a host reference.

Examples:
  # Vector addition with the defaults
  pimwalk run

  # Edge walk over 1M edges on 16 accelerators
  pimwalk run --kernel edge-reduce --accelerators 16 --input-size 1048576

  # Weak scaling: 4096 elements per accelerator
  pimwalk run --scaling weak --input-size 4096 --accelerators 8

  # Write a program image and run from it
  pimwalk image --output pimwalk.bin
  pimwalk run --binary pimwalk.bin
"#)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run rounds of a kernel and verify
    Run(RunCommand),

    /// Write a program image
    Image(ImageCommand),

    /// Show the effective configuration and dispatch table
    Info,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let _ = setup_logging(&LoggingConfig::default(), cli.log_level.as_deref());
            report_error(&e);
            std::process::exit(EXIT_FAILURE);
        }
    };
    if let Err(e) = setup_logging(&config.logging, cli.log_level.as_deref()) {
        eprintln!("{e}");
    }

    let result: Result<i32> = match cli.command {
        Commands::Run(cmd) => cmd.execute(&config),
        Commands::Image(cmd) => cmd.execute(&config).map(|_| EXIT_SUCCESS),
        Commands::Info => {
            pimwalk_cli::commands::show_info(&config);
            Ok(EXIT_SUCCESS)
        }
        Commands::Config { action } => {
            handle_config_command(action, &config, cli.config.as_deref()).map(|()| EXIT_SUCCESS)
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            report_error(&e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn report_error(e: &anyhow::Error) {
    error!("Command failed: {}", e);
    for cause in e.chain().skip(1) {
        error!("  Caused by: {}", cause);
    }
}
