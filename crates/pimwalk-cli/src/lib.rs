//! Command implementations behind the `pimwalk` binary.

pub mod commands;
pub mod exit;
pub mod logging;

pub use commands::{ConfigAction, ImageCommand, RunCommand, load_configuration};
pub use exit::{EXIT_FAILURE, EXIT_SUCCESS, EXIT_VERIFICATION_FAILED};
