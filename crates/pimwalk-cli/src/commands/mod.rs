//! CLI command implementations

pub mod config;
pub mod image;
pub mod info;
pub mod run;

pub use config::{ConfigAction, DEFAULT_CONFIG_FILE, load_configuration};
pub use image::ImageCommand;
pub use info::show_info;
pub use run::RunCommand;
