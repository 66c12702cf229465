//! Config CLI commands.
//!
//! Commands for managing the heicwall configuration file.

use std::path::PathBuf;

use clap::Subcommand;
use colored::Colorize;

use crate::config::template::{create_config_file, generate_config_template};
use crate::config::{config_paths, get_config_path};
use crate::error::HeicwallError;

/// Config management commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum ConfigCommands {
    /// Initialize a new configuration file with all options documented.
    ///
    /// Every option is written commented out; uncomment the ones you need.
    #[command(
        name = "init",
        after_long_help = r#"Examples:
  heicwall config init              # Create config at default location
  heicwall config init --force      # Overwrite existing config
  heicwall config init --path ~/my-config.jsonc  # Create at custom path
  heicwall config init --stdout     # Print template to stdout"#
    )]
    Init {
        /// Overwrite existing configuration file if it exists.
        #[arg(long, short)]
        force: bool,

        /// Custom path for the configuration file.
        /// If not specified, uses the first search path.
        #[arg(long, short, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Print the configuration template to stdout instead of writing to a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Show the configuration file search paths.
    ///
    /// Marks the file that is currently in use, if any.
    Path,
}

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cmd: &ConfigCommands) -> Result<(), HeicwallError> {
    match cmd {
        ConfigCommands::Init { force, path, stdout } => {
            if *stdout {
                println!("{}", generate_config_template());
                Ok(())
            } else {
                init_config(*force, path.clone())
            }
        }
        ConfigCommands::Path => {
            show_config_path();
            Ok(())
        }
    }
}

/// Initialize a new configuration file.
fn init_config(force: bool, custom_path: Option<PathBuf>) -> Result<(), HeicwallError> {
    let config_path = custom_path
        .or_else(|| config_paths().into_iter().next())
        .unwrap_or_else(|| PathBuf::from("config.jsonc"));

    if config_path.exists() {
        if !force {
            return Err(HeicwallError::Config(format!(
                "Configuration file already exists at: {}\nUse --force to overwrite.",
                config_path.display()
            )));
        }
        std::fs::remove_file(&config_path)?;
    }

    create_config_file(&config_path).map_err(|e| {
        HeicwallError::Config(format!("Failed to create config file {}: {e}", config_path.display()))
    })?;

    println!("Configuration file created at: {}", config_path.display());
    println!("\nAll options are commented out by default.");
    println!("Edit the file and uncomment the options you want to configure.");

    Ok(())
}

/// Print the search paths, marking the active one.
fn show_config_path() {
    println!("Configuration file search paths (in priority order):\n");

    let active = get_config_path().cloned().or_else(|| config_paths().into_iter().find(|path| path.exists()));

    for (i, path) in config_paths().iter().enumerate() {
        let marker = if active.as_ref() == Some(path) {
            " (active)".green().to_string()
        } else if path.exists() {
            " (exists)".dimmed().to_string()
        } else {
            String::new()
        };

        println!("  {}. {}{}", i + 1, path.display(), marker);
    }

    match active {
        Some(path) if !config_paths().contains(&path) => {
            println!("\nUsing custom configuration: {}", path.display());
        }
        Some(_) => {}
        None => {
            println!("\nNo configuration file found.");
            println!("Run 'heicwall config init' to create one.");
        }
    }
}
