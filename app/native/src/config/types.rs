//! Configuration types for heicwall.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::APP_NAME;
use crate::platform::path::expand_and_resolve;

/// Theme assumed when none is given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ThemePreference {
    /// Use the light frame of appearance wallpapers. This is the default.
    #[default]
    Light,
    /// Use the dark frame of appearance wallpapers.
    Dark,
}

impl ThemePreference {
    #[must_use]
    pub const fn is_light(self) -> bool { matches!(self, Self::Light) }
}

/// Dynamic wallpaper configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct WallpaperConfig {
    /// Folder containing `.heic` dynamic wallpapers.
    /// Supports `~`; relative paths are resolved against the config file's folder.
    pub path: String,

    /// Directory where decoded definitions and frames are stored.
    /// Defaults to the platform data directory.
    pub data_dir: String,

    /// Theme used for appearance wallpapers: "light" or "dark".
    pub theme: ThemePreference,

    /// Latitude of the display location, in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Longitude of the display location, in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Folder of the file this configuration was loaded from.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl WallpaperConfig {
    /// Returns whether a wallpaper folder is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool { !self.path.trim().is_empty() }

    /// Resolved wallpaper folder, if configured.
    #[must_use]
    pub fn folder(&self) -> Option<PathBuf> { self.resolve(&self.path) }

    /// Resolved data directory override, if configured.
    #[must_use]
    pub fn data_dir(&self) -> Option<PathBuf> { self.resolve(&self.data_dir) }

    fn resolve(&self, value: &str) -> Option<PathBuf> {
        if value.trim().is_empty() {
            return None;
        }
        let base = self.base_dir.as_deref().unwrap_or_else(|| Path::new("."));
        Some(expand_and_resolve(value, base))
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct HeicwallConfig {
    /// JSON schema reference, ignored at runtime.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Dynamic wallpaper settings.
    pub wallpapers: WallpaperConfig,
}

/// Errors that can occur when loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. Expected at ~/.config/heicwall/config.json \
         or ~/.heicwall.json"
    )]
    NotFound,

    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration file names, in order of preference.
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Home-directory file names.
const HOME_CONFIG_FILE_NAMES: &[&str] = &[".heicwall.jsonc", ".heicwall.json"];

/// Returns the candidate configuration file paths, in search order.
///
/// 1. `$XDG_CONFIG_HOME/heicwall/`
/// 2. `~/.config/heicwall/`
/// 3. The platform config directory
/// 4. `~/.heicwall.jsonc` / `~/.heicwall.json`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut dirs_to_search = Vec::new();
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        dirs_to_search.push(PathBuf::from(xdg_config).join(APP_NAME));
    }
    if let Some(home) = dirs::home_dir() {
        dirs_to_search.push(home.join(".config").join(APP_NAME));
    }
    if let Some(config_dir) = dirs::config_dir() {
        dirs_to_search.push(config_dir.join(APP_NAME));
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for dir in dirs_to_search {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Some(home) = dirs::home_dir() {
        paths.extend(HOME_CONFIG_FILE_NAMES.iter().map(|filename| home.join(filename)));
    }

    paths
}

/// Parses JSONC configuration text.
///
/// # Errors
///
/// Returns `ConfigError::Parse` if the content is not valid JSON after
/// comments are stripped.
pub fn parse_config<R: Read>(reader: R) -> Result<HeicwallConfig, ConfigError> {
    let reader = json_comments::StripComments::new(reader);
    Ok(serde_json::from_reader(reader)?)
}

/// Loads the configuration from a specific file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist,
/// `ConfigError::Io` if it cannot be read and `ConfigError::Parse` if it is
/// not valid JSONC.
pub fn load_config_from_path(path: &Path) -> Result<(HeicwallConfig, PathBuf), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }

    let mut config = parse_config(fs::File::open(path)?)?;
    config.wallpapers.base_dir = path.parent().map(Path::to_path_buf);
    Ok((config, path.to_path_buf()))
}

/// Loads the configuration from the first available config file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists in any of
/// the expected locations, or the errors of [`load_config_from_path`].
pub fn load_config() -> Result<(HeicwallConfig, PathBuf), ConfigError> {
    config_paths()
        .into_iter()
        .find(|path| path.exists())
        .map_or(Err(ConfigError::NotFound), |path| load_config_from_path(&path))
}
