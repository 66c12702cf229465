//! Wallpaper CLI commands.
//!
//! Inspect raw metadata blobs, decode wallpapers into cached definitions,
//! evaluate which frame to show, and scan whole folders.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use colored::Colorize;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::bplist::{self, Value};
use crate::cache::get_data_dir;
use crate::cli::output;
use crate::config::get_config;
use crate::error::HeicwallError;
use crate::platform::path::collapse_home;
use crate::wallpaper::metadata::{self, TagMap};
use crate::wallpaper::model::parse_time_of_day;
use crate::wallpaper::{
    CurrentEnvironment, DefinitionCache, SidecarMetadata, WallpaperDefinition, WallpaperLibrary, decode_definition,
    evaluate, frame_path,
};

/// Magic bytes at the start of a binary property list.
const BPLIST_MAGIC: &[u8] = b"bplist00";

/// Arguments of the `inspect` command.
#[derive(Args, Debug)]
#[command(after_long_help = r#"Examples:
  heicwall inspect YnBsaXN0MDDSAQIDBFFkUWwQARAACA0PERMAAAAAAAABAQAAAAAAAAAFAAAAAAAAAAAAAAAAAAAAFQ==
  heicwall inspect --file solar.b64   # Base64 text or raw bplist00 bytes"#)]
pub struct InspectArgs {
    /// Base64-encoded binary property list.
    #[arg(value_name = "BASE64", required_unless_present = "file", conflicts_with = "file")]
    pub blob: Option<String>,

    /// Read the property list from a file instead.
    #[arg(long, short, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Arguments of the `decode` command.
#[derive(Args, Debug)]
#[command(after_long_help = r#"Examples:
  heicwall decode Mojave.heic                         # Tags from Mojave.heic.json
  heicwall decode Mojave.heic --tags tags.json --json # Explicit extractor output"#)]
pub struct DecodeArgs {
    /// The `.heic` file to decode.
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Extractor JSON output holding the image tags.
    /// Defaults to `<IMAGE>.json`.
    #[arg(long, short, value_name = "PATH")]
    pub tags: Option<PathBuf>,

    /// Output in JSON format instead of tables.
    #[arg(long, short)]
    pub json: bool,
}

/// Arguments of the `evaluate` command.
#[derive(Args, Debug)]
#[command(after_long_help = r#"Examples:
  heicwall evaluate 9f86d081884c             # Frame for the current time and configured theme
  heicwall evaluate 9f86d081884c --at 21:30  # Frame at a given time of day
  heicwall evaluate 9f86d081884c --dark      # Force the dark theme"#)]
pub struct EvaluateArgs {
    /// Content hash of a cached wallpaper (see `heicwall cache list`).
    #[arg(value_name = "HASH")]
    pub hash: String,

    /// Local time of day to evaluate at (HH:MM or HH:MM:SS). Defaults to now.
    #[arg(long, short, value_name = "TIME")]
    pub at: Option<String>,

    /// Evaluate with the light theme.
    #[arg(long, short, conflicts_with = "dark")]
    pub light: bool,

    /// Evaluate with the dark theme.
    #[arg(long, short)]
    pub dark: bool,

    /// Latitude of the display location, in degrees.
    #[arg(long, requires = "longitude", allow_hyphen_values = true)]
    pub latitude: Option<f64>,

    /// Longitude of the display location, in degrees.
    #[arg(long, requires = "latitude", allow_hyphen_values = true)]
    pub longitude: Option<f64>,

    /// Output in JSON format.
    #[arg(long, short)]
    pub json: bool,
}

/// Arguments of the `scan` command.
#[derive(Args, Debug)]
#[command(after_long_help = r#"Examples:
  heicwall scan                    # Scan the configured wallpapers.path
  heicwall scan ~/Pictures/Dynamic # Scan a specific folder"#)]
pub struct ScanArgs {
    /// Folder to scan. Defaults to `wallpapers.path` from the configuration.
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, short)]
    pub json: bool,
}

// ============================================================================
// Inspect
// ============================================================================

/// Execute the inspect command.
pub fn execute_inspect(args: &InspectArgs) -> Result<(), HeicwallError> {
    let value = match (&args.blob, &args.file) {
        (Some(blob), _) => bplist::decode_base64(blob)?,
        (None, Some(path)) => read_plist_file(path)?,
        (None, None) => {
            return Err(HeicwallError::InvalidArguments(
                "Either <BASE64> or --file must be specified.".to_string(),
            ));
        }
    };

    output::print_highlighted_json(&serde_json::Value::from(&value));
    Ok(())
}

/// Reads raw `bplist00` bytes, or base64 text of them.
fn read_plist_file(path: &Path) -> Result<Value, HeicwallError> {
    let bytes = fs::read(path).map_err(|err| HeicwallError::Io(format!("{}: {err}", path.display())))?;
    if bytes.starts_with(BPLIST_MAGIC) {
        return Ok(bplist::decode(&bytes)?);
    }

    let text = String::from_utf8(bytes)
        .map_err(|_| HeicwallError::InvalidArguments(format!("{} is neither bplist00 nor base64", path.display())))?;
    Ok(bplist::decode_base64(&text)?)
}

// ============================================================================
// Decode
// ============================================================================

/// Execute the decode command.
pub fn execute_decode(args: &DecodeArgs) -> Result<(), HeicwallError> {
    let tags_path = args.tags.clone().unwrap_or_else(|| SidecarMetadata::sidecar_path(&args.image));
    let text = fs::read_to_string(&tags_path)
        .map_err(|err| HeicwallError::Io(format!("{}: {err}", tags_path.display())))?;
    let tags = TagMap::from_extractor_json(&text)?;

    let hash = metadata::hash_file(&args.image)
        .map_err(|err| HeicwallError::Io(format!("{}: {err}", args.image.display())))?;
    let filename = args.image.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
    let definition = decode_definition(&tags, hash, filename)?;

    let cache = DefinitionCache::new(get_data_dir());
    cache.store(&definition)?;

    if args.json {
        output::print_highlighted_json(&serde_json::to_value(&definition)?);
    } else {
        print_definition(&definition);
        println!(
            "\n{} {}",
            "Stored in".dimmed(),
            collapse_home(&cache.definition_path(definition.content_hash())?)
        );
    }
    Ok(())
}

/// Prints a definition summary followed by one table per phase set.
fn print_definition(definition: &WallpaperDefinition) {
    #[derive(Tabled)]
    struct TimeRow {
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Frame")]
        frame: u16,
    }

    #[derive(Tabled)]
    struct SolarRow {
        #[tabled(rename = "Frame")]
        frame: u16,
        #[tabled(rename = "Elevation")]
        elevation: String,
        #[tabled(rename = "Azimuth")]
        azimuth: String,
    }

    println!("{}", definition.source_filename().bold());
    println!("  {:<8} {}", "Hash".dimmed(), definition.content_hash());
    println!("  {:<8} {}x{}", "Size".dimmed(), definition.width(), definition.height());
    println!("  {:<8} {}", "Frames".dimmed(), definition.number_of_frames());
    println!("  {:<8} {}", "Kinds".dimmed(), output::format_kinds(&definition.kinds()));

    if let Some(phases) = definition.time_phases() {
        let rows: Vec<TimeRow> = phases
            .iter()
            .map(|phase| TimeRow { time: phase.time.format("%H:%M:%S").to_string(), frame: phase.frame_index })
            .collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::last()).with(Alignment::right()))
            .to_string();
        println!("\n{}", format!("Time phases ({})", phases.len()).bold());
        println!("{table}");
    }

    if let Some(phases) = definition.solar_phases() {
        let rows: Vec<SolarRow> = phases
            .iter()
            .map(|phase| SolarRow {
                frame: phase.frame_index,
                elevation: format!("{:.2}°", phase.elevation_degrees),
                azimuth: format!("{:.2}°", phase.azimuth_degrees),
            })
            .collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(0..3)).with(Alignment::right()))
            .to_string();
        println!("\n{}", format!("Solar phases ({})", phases.len()).bold());
        println!("{table}");
    }

    if let Some(phase) = definition.appearance_phase() {
        println!("\n{}", "Appearance".bold());
        println!("  {:<8} {}", "Light".dimmed(), phase.light_frame_index);
        println!("  {:<8} {}", "Dark".dimmed(), phase.dark_frame_index);
    }
}

// ============================================================================
// Evaluate
// ============================================================================

/// Builds the evaluation environment from the arguments and configuration.
fn environment_for(args: &EvaluateArgs) -> Result<CurrentEnvironment, HeicwallError> {
    let wallpapers = &get_config().wallpapers;
    let is_light = match (args.light, args.dark) {
        (true, _) => true,
        (_, true) => false,
        _ => wallpapers.theme.is_light(),
    };

    let environment = match &args.at {
        Some(text) => {
            let now = parse_time_of_day(text).ok_or_else(|| {
                HeicwallError::InvalidArguments(format!("Invalid time of day '{text}'. Use HH:MM or HH:MM:SS."))
            })?;
            CurrentEnvironment::new(now, is_light)
        }
        None => CurrentEnvironment::capture(is_light),
    };

    Ok(environment.with_location(
        args.latitude.or(wallpapers.latitude),
        args.longitude.or(wallpapers.longitude),
    ))
}

/// Execute the evaluate command.
pub fn execute_evaluate(args: &EvaluateArgs) -> Result<(), HeicwallError> {
    let environment = environment_for(args)?;
    let data_dir = get_data_dir();
    let cache = DefinitionCache::new(&data_dir);

    let definition = cache.load(&args.hash)?.ok_or_else(|| HeicwallError::NotCached(args.hash.clone()))?;
    let kind = definition.phase_sets().next().map(|set| set.kind());
    let frame = evaluate(&environment, &definition, &mut rand::rng());

    let (Some(kind), Some(frame)) = (kind, frame) else {
        return Err(HeicwallError::Command(format!(
            "{} has no phases to evaluate",
            definition.source_filename()
        )));
    };
    let path = frame_path(&data_dir, definition.content_hash(), frame);

    if args.json {
        output::print_highlighted_json(&serde_json::json!({
            "hash": definition.content_hash(),
            "filename": definition.source_filename(),
            "kind": kind,
            "time": environment.now.format("%H:%M:%S").to_string(),
            "lightTheme": environment.is_light_theme_enabled,
            "frame": frame,
            "framePath": path,
        }));
    } else {
        println!(
            "{} {} {}",
            definition.source_filename().bold(),
            format!("({kind})").dimmed(),
            format!("frame {frame}").green()
        );
        println!("{}", collapse_home(&path));
    }
    Ok(())
}

// ============================================================================
// Scan
// ============================================================================

/// Execute the scan command.
pub fn execute_scan(args: &ScanArgs) -> Result<(), HeicwallError> {
    #[derive(Tabled)]
    struct WallpaperRow {
        #[tabled(rename = "File")]
        file: String,
        #[tabled(rename = "Hash")]
        hash: String,
        #[tabled(rename = "Kinds")]
        kinds: String,
        #[tabled(rename = "Frames")]
        frames: u16,
        #[tabled(rename = "Size")]
        size: String,
        #[tabled(rename = "Cached")]
        cached: String,
    }

    let dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => get_config().wallpapers.folder().ok_or_else(|| {
            HeicwallError::InvalidArguments(
                "No folder given and wallpapers.path is not configured.".to_string(),
            )
        })?,
    };
    if !dir.is_dir() {
        return Err(HeicwallError::InvalidArguments(format!("Not a directory: {}", dir.display())));
    }

    let library = WallpaperLibrary::new(DefinitionCache::new(get_data_dir()), SidecarMetadata);
    let report = library.scan(&dir);

    if args.json {
        let wallpapers: Vec<_> = report
            .wallpapers
            .iter()
            .map(|loaded| {
                serde_json::json!({
                    "path": loaded.path,
                    "fromCache": loaded.from_cache,
                    "definition": loaded.definition,
                })
            })
            .collect();
        let failures: Vec<_> = report
            .failures
            .iter()
            .map(|failure| serde_json::json!({ "path": failure.path, "error": failure.message }))
            .collect();
        output::print_highlighted_json(&serde_json::json!({ "wallpapers": wallpapers, "failures": failures }));
        return Ok(());
    }

    if report.wallpapers.is_empty() && report.failures.is_empty() {
        println!("{}", format!("No .heic files in {}.", collapse_home(&dir)).dimmed());
        return Ok(());
    }

    if !report.wallpapers.is_empty() {
        let rows: Vec<WallpaperRow> = report
            .wallpapers
            .iter()
            .map(|loaded| {
                let definition = &loaded.definition;
                WallpaperRow {
                    file: output::truncate(definition.source_filename(), 40),
                    hash: output::short_hash(definition.content_hash()).to_string(),
                    kinds: output::format_kinds(&definition.kinds()),
                    frames: definition.number_of_frames(),
                    size: format!("{}x{}", definition.width(), definition.height()),
                    cached: output::format_bool(loaded.from_cache),
                }
            })
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
            .with(Modify::new(Columns::last()).with(Alignment::center()))
            .to_string();

        let count = report.wallpapers.len();
        let hits = report.cache_hits();
        println!("{} {}", format!("Wallpapers ({count})").bold(), format!("{hits} from cache").dimmed());
        println!("{table}");
    }

    for failure in &report.failures {
        let name = failure.path.file_name().map_or_else(
            || failure.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        println!("{} {name}: {}", "Failed:".red(), failure.message);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPEARANCE_BLOB: &str =
        "YnBsaXN0MDDSAQIDBFFkUWwQARAACA0PERMAAAAAAAABAQAAAAAAAAAFAAAAAAAAAAAAAAAAAAAAFQ==";

    fn evaluate_args(at: Option<&str>, light: bool, dark: bool) -> EvaluateArgs {
        EvaluateArgs {
            hash: "abc".to_string(),
            at: at.map(str::to_string),
            light,
            dark,
            latitude: Some(10.0),
            longitude: Some(20.0),
            json: false,
        }
    }

    // ========================================================================
    // Inspect input handling
    // ========================================================================

    #[test]
    fn test_read_plist_file_accepts_base64_text() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("blob.b64");
        fs::write(&path, format!("{APPEARANCE_BLOB}\n")).unwrap();

        let value = read_plist_file(&path).unwrap();
        assert_eq!(value.get("l").and_then(Value::as_integer), Some(0));
        assert_eq!(value.get("d").and_then(Value::as_integer), Some(1));
    }

    #[test]
    fn test_read_plist_file_accepts_raw_bytes() {
        use base64::Engine as _;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("blob.plist");
        let bytes = base64::engine::general_purpose::STANDARD.decode(APPEARANCE_BLOB).unwrap();
        fs::write(&path, bytes).unwrap();

        let value = read_plist_file(&path).unwrap();
        assert!(value.as_dictionary().is_some());
    }

    #[test]
    fn test_read_plist_file_rejects_binary_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("garbage.bin");
        fs::write(&path, [0xFF, 0xFE, 0x00, 0x80]).unwrap();

        assert!(matches!(read_plist_file(&path), Err(HeicwallError::InvalidArguments(_))));
    }

    #[test]
    fn test_read_plist_file_missing() {
        let result = read_plist_file(Path::new("/nonexistent/heicwall/blob"));
        assert!(matches!(result, Err(HeicwallError::Io(_))));
    }

    // ========================================================================
    // Evaluation environment
    // ========================================================================

    #[test]
    fn test_environment_for_parses_time() {
        let environment = environment_for(&evaluate_args(Some("07:30"), false, true)).unwrap();
        assert_eq!(environment.now, chrono::NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert!(!environment.is_light_theme_enabled);
        assert_eq!(environment.latitude, Some(10.0));
        assert_eq!(environment.longitude, Some(20.0));
    }

    #[test]
    fn test_environment_for_light_flag() {
        let environment = environment_for(&evaluate_args(Some("12:00:00"), true, false)).unwrap();
        assert!(environment.is_light_theme_enabled);
    }

    #[test]
    fn test_environment_for_rejects_bad_time() {
        let result = environment_for(&evaluate_args(Some("25:99"), false, false));
        assert!(matches!(result, Err(HeicwallError::InvalidArguments(_))));
    }
}
