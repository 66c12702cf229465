//! CLI module for heicwall.
//!
//! Parses command-line arguments, sets up logging and runs the selected
//! command against the library.

mod commands;
mod output;

use clap::Parser;
pub use commands::Cli;

use crate::error::HeicwallError;
use crate::logging;

/// Runs the CLI.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), HeicwallError> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    cli.execute()
}
