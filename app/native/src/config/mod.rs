//! Configuration module for heicwall.
//!
//! The configuration is loaded once per process. A `--config` path given on
//! the command line replaces the default search paths.

pub mod template;
pub mod types;

use std::path::PathBuf;
use std::sync::OnceLock;

pub use types::{
    ConfigError, HeicwallConfig, ThemePreference, WallpaperConfig, config_paths, load_config,
    load_config_from_path, parse_config,
};

/// Global configuration instance, loaded once at startup.
static CONFIG: OnceLock<HeicwallConfig> = OnceLock::new();

/// Path to the currently loaded configuration file.
static CONFIG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Custom config path override (set via CLI --config flag).
static CUSTOM_CONFIG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Sets a custom configuration file path to use instead of the default search paths.
///
/// Must be called before the configuration is first read. Returns `false` if a
/// path was already set.
pub fn set_custom_config_path(path: PathBuf) -> bool { CUSTOM_CONFIG_PATH.set(path).is_ok() }

fn load_or_default() -> HeicwallConfig {
    let result = CUSTOM_CONFIG_PATH.get().map_or_else(load_config, |path| load_config_from_path(path));

    match result {
        Ok((config, path)) => {
            tracing::debug!(path = %path.display(), "loaded configuration");
            let _ = CONFIG_PATH.set(path);
            config
        }
        Err(ConfigError::NotFound) => {
            if let Some(path) = CUSTOM_CONFIG_PATH.get() {
                tracing::warn!(path = %path.display(), "configuration file not found, using defaults");
            } else {
                tracing::debug!("no configuration file found, using defaults");
            }
            HeicwallConfig::default()
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to load configuration, using defaults");
            HeicwallConfig::default()
        }
    }
}

/// Returns the global configuration instance, loading it on first use.
///
/// Falls back to the default configuration if no file is found or it is invalid.
pub fn get_config() -> &'static HeicwallConfig { CONFIG.get_or_init(load_or_default) }

/// Returns the path to the loaded configuration file, if any.
pub fn get_config_path() -> Option<&'static PathBuf> { CONFIG_PATH.get() }
