//! CLI command definitions using Clap.
//!
//! Commands are organized into domain-specific submodules:
//!
//! - `wallpaper` - Inspecting, decoding, evaluating and scanning wallpapers
//! - `cache` - Definition cache management commands
//! - `config_cmd` - Configuration file commands

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::constants::APP_NAME;
use crate::error::HeicwallError;
use crate::{config, schema};

pub mod cache;
pub mod config_cmd;
pub mod wallpaper;

pub use cache::CacheCommands;
pub use config_cmd::ConfigCommands;
pub use wallpaper::{DecodeArgs, EvaluateArgs, InspectArgs, ScanArgs};

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Heicwall - decode dynamic HEIC wallpaper metadata and pick the frame to display.
#[derive(Parser, Debug)]
#[command(name = "heicwall")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr.
    ///
    /// `HEICWALL_LOG` or `RUST_LOG` take precedence when set.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Decode a binary property list and print it as JSON.
    ///
    /// Accepts the base64 text of a `Solar`, `H24` or `Apr` tag, or a file
    /// holding either that text or raw `bplist00` bytes.
    Inspect(InspectArgs),

    /// Build the definition of a wallpaper and store it in the cache.
    ///
    /// Reads the tags produced by the metadata extractor, decodes the dynamic
    /// metadata and prints the resulting definition.
    Decode(DecodeArgs),

    /// Pick the frame to display for a cached wallpaper.
    Evaluate(EvaluateArgs),

    /// Load every wallpaper of a folder.
    ///
    /// Cached definitions are reused; other files are decoded from their
    /// `<file>.json` sidecar and stored.
    Scan(ScanArgs),

    /// Definition cache management commands.
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Configuration file management commands.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Output the configuration JSON Schema.
    ///
    /// Can be redirected to a file for use with editors that support JSON
    /// Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(heicwall completions --shell zsh)"
    ///   heicwall completions --shell fish > ~/.config/fish/completions/heicwall.fish
    #[command(verbatim_doc_comment)]
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<&PathBuf> { self.config.as_ref() }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), HeicwallError> {
        if let Some(path) = &self.config {
            if !path.exists() {
                return Err(HeicwallError::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            config::set_custom_config_path(path.clone());
        }

        match &self.command {
            Commands::Inspect(args) => wallpaper::execute_inspect(args),
            Commands::Decode(args) => wallpaper::execute_decode(args),
            Commands::Evaluate(args) => wallpaper::execute_evaluate(args),
            Commands::Scan(args) => wallpaper::execute_scan(args),
            Commands::Cache(cmd) => cache::execute(cmd),
            Commands::Config(cmd) => config_cmd::execute(cmd),

            Commands::Schema => {
                println!("{}", schema::generate_schema_json());
                Ok(())
            }

            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, APP_NAME, &mut io::stdout());
    }
}
