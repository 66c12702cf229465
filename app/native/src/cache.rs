//! Application data directory utilities.
//!
//! Every decoded wallpaper gets its own `<data dir>/<content hash>/` folder
//! holding the cached definition and the rasterized frames. The directory
//! defaults to the platform data dir (`~/.local/share/heicwall` on Linux,
//! `~/Library/Application Support/heicwall` on macOS) and can be overridden by
//! `wallpapers.dataDir` in the configuration.

use std::path::{Path, PathBuf};

use crate::config::get_config;
use crate::constants::APP_NAME;

/// Returns the platform default data directory for the application.
///
/// Falls back to `/tmp/heicwall` if the platform directory is unavailable.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(format!("/tmp/{APP_NAME}")), |data| data.join(APP_NAME))
}

/// Returns the data directory, honoring the configured override.
#[must_use]
pub fn get_data_dir() -> PathBuf { get_config().wallpapers.data_dir().unwrap_or_else(default_data_dir) }

/// Removes a data directory and everything in it.
///
/// # Returns
///
/// The approximate number of bytes freed. A missing directory frees nothing.
///
/// # Errors
///
/// Returns an error if the directory cannot be measured or removed.
pub fn clear_data_dir(dir: &Path) -> std::io::Result<u64> {
    if !dir.exists() {
        return Ok(0);
    }

    let bytes_freed = calculate_dir_size(dir)?;
    std::fs::remove_dir_all(dir)?;

    Ok(bytes_freed)
}

/// Calculates the total size of a directory in bytes.
pub fn calculate_dir_size(path: &Path) -> std::io::Result<u64> {
    let mut total = 0u64;

    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                total += calculate_dir_size(&path)?;
            } else {
                total += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
    }

    Ok(total)
}

/// Formats a byte count as a human-readable string like "1.50 MB".
#[must_use]
#[allow(clippy::cast_precision_loss)] // Precision loss is acceptable for human-readable output
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} bytes")
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_default_data_dir_contains_app_name() {
        let path = default_data_dir();
        let path_str = path.to_string_lossy();
        assert!(path_str.contains(APP_NAME), "Path should contain app name: {path_str}");
    }

    #[test]
    fn test_clear_data_dir_reports_freed_bytes() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("data");
        std::fs::create_dir_all(dir.join("abc")).unwrap();
        std::fs::write(dir.join("abc").join("definition.json"), [0u8; 100]).unwrap();
        std::fs::write(dir.join("abc").join("frame-0.jpg"), [0u8; 28]).unwrap();

        assert_eq!(clear_data_dir(&dir).unwrap(), 128);
        assert!(!dir.exists());
    }

    #[test]
    fn test_clear_missing_data_dir() {
        let temp = TempDir::new().unwrap();
        assert_eq!(clear_data_dir(&temp.path().join("missing")).unwrap(), 0);
    }

    #[test]
    fn test_format_bytes_bytes() {
        assert_eq!(format_bytes(0), "0 bytes");
        assert_eq!(format_bytes(1023), "1023 bytes");
    }

    #[test]
    fn test_format_bytes_kb() {
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
    }

    #[test]
    fn test_format_bytes_mb_and_gb() {
        assert_eq!(format_bytes(1024 * 1024 + 512 * 1024), "1.50 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GB");
    }
}
