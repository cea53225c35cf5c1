//! `image`: write a program image for the current dispatch table.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use pimwalk_common::PimConfig;
use pimwalk_device::ProgramImage;
use tracing::info;

#[derive(Args, Debug)]
pub struct ImageCommand {
    /// Where to write the image
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Tasklets per accelerator the image is built for
    #[arg(long, value_name = "N")]
    pub tasklets: Option<usize>,
}

impl ImageCommand {
    pub fn execute(&self, config: &PimConfig) -> Result<ProgramImage> {
        let tasklets = self.tasklets.unwrap_or(config.system.tasklets);
        let image = ProgramImage::for_device(tasklets);
        image
            .write_to(&self.output)
            .with_context(|| format!("Failed to write program image to {}", self.output.display()))?;
        info!(path = %self.output.display(), tasklets, "program image written");
        println!(
            "{} {} ({} tasklet(s), {} kernel(s))",
            style("Wrote").green().bold(),
            self.output.display(),
            tasklets,
            image.kernels.len()
        );
        Ok(image)
    }
}
