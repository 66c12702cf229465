//! Configuration template generation.

use std::fs;
use std::path::Path;

/// Generates a configuration template with every option commented out.
#[must_use]
pub fn generate_config_template() -> String {
    r#"// heicwall configuration file
// ===========================
// This file uses JSONC format (JSON with comments).
// All options below are commented out and show their default values.
// Uncomment and modify the options you want to configure.

{
  // "wallpapers": {
  //   // Folder containing .heic dynamic wallpapers (~ is expanded,
  //   // relative paths are resolved against this file's folder)
  //   "path": "",
  //
  //   // Where decoded definitions and extracted frames are stored
  //   // (empty = platform data directory)
  //   "dataDir": "",
  //
  //   // Theme used for light/dark wallpapers: "light" or "dark"
  //   "theme": "light",
  //
  //   // Location of the display, in degrees
  //   "latitude": 46.52,
  //   "longitude": 6.63
  // }
}
"#
    .to_string()
}

/// Writes the template to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the file already exists or cannot be written.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists", path.display()),
        ));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, generate_config_template())
}
