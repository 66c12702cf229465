//! Cache CLI commands.
//!
//! Inspect and prune the per-wallpaper entries of the data directory.

use clap::Subcommand;
use colored::Colorize;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::cache::{clear_data_dir, format_bytes, get_data_dir};
use crate::cli::output;
use crate::error::HeicwallError;
use crate::wallpaper::DefinitionCache;

/// Cache subcommands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum CacheCommands {
    /// Show the data directory location.
    #[command(after_long_help = r#"Examples:
  heicwall cache path    # Print the data directory path"#)]
    Path,

    /// List cached wallpaper definitions.
    #[command(after_long_help = r#"Examples:
  heicwall cache list          # Table of cached definitions
  heicwall cache list --json   # Full definitions as JSON"#)]
    List {
        /// Output in JSON format instead of table format.
        #[arg(long, short)]
        json: bool,
    },

    /// Remove the cached entry of one wallpaper.
    #[command(after_long_help = r#"Examples:
  heicwall cache remove 9f86d081884c7d65...   # Full content hash"#)]
    Remove {
        /// Content hash of the wallpaper.
        #[arg(value_name = "HASH")]
        hash: String,
    },

    /// Clear the whole data directory.
    ///
    /// Removes every cached definition and rasterized frame.
    #[command(after_long_help = r#"Examples:
  heicwall cache clear   # Clear all cached data"#)]
    Clear,
}

/// Execute cache subcommands.
///
/// # Errors
///
/// Returns an error if the cache cannot be read or modified.
pub fn execute(cmd: &CacheCommands) -> Result<(), HeicwallError> {
    match cmd {
        CacheCommands::Path => {
            println!("{}", get_data_dir().display());
            Ok(())
        }
        CacheCommands::List { json } => execute_list(*json),
        CacheCommands::Remove { hash } => execute_remove(hash),
        CacheCommands::Clear => execute_clear(),
    }
}

/// Execute the cache list command.
fn execute_list(json: bool) -> Result<(), HeicwallError> {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "Hash")]
        hash: String,
        #[tabled(rename = "File")]
        file: String,
        #[tabled(rename = "Kinds")]
        kinds: String,
        #[tabled(rename = "Frames")]
        frames: u16,
    }

    let cache = DefinitionCache::new(get_data_dir());
    let definitions: Vec<_> =
        cache.hashes()?.iter().filter_map(|hash| cache.load(hash).ok().flatten()).collect();

    if json {
        output::print_highlighted_json(&serde_json::to_value(&definitions)?);
        return Ok(());
    }

    if definitions.is_empty() {
        println!("{}", "No cached definitions.".dimmed());
        return Ok(());
    }

    let rows: Vec<EntryRow> = definitions
        .iter()
        .map(|definition| EntryRow {
            hash: definition.content_hash().to_string(),
            file: output::truncate(definition.source_filename(), 40),
            kinds: output::format_kinds(&definition.kinds()),
            frames: definition.number_of_frames(),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::last()).with(Alignment::right()))
        .to_string();

    println!("{}", format!("Cached definitions ({})", definitions.len()).bold());
    println!("{table}");
    Ok(())
}

/// Execute the cache remove command.
fn execute_remove(hash: &str) -> Result<(), HeicwallError> {
    let cache = DefinitionCache::new(get_data_dir());
    if cache.remove(hash)? {
        println!("Removed {hash}.");
        Ok(())
    } else {
        Err(HeicwallError::NotCached(hash.to_string()))
    }
}

/// Execute the cache clear command.
fn execute_clear() -> Result<(), HeicwallError> {
    let data_dir = get_data_dir();
    if !data_dir.exists() {
        println!("Data directory does not exist. Nothing to clear.");
        return Ok(());
    }

    let bytes_freed = clear_data_dir(&data_dir)
        .map_err(|err| HeicwallError::Io(format!("Failed to clear {}: {err}", data_dir.display())))?;
    println!("Cache cleared successfully. Freed {}.", format_bytes(bytes_freed));
    Ok(())
}
