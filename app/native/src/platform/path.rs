//! Path helpers for user-supplied paths.
//!
//! Configured folders may start with `~` and may be relative to the directory
//! holding the configuration file.

use std::path::{Path, PathBuf};

/// Expands a leading `~` to the home directory. Empty input yields an empty path.
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();
    if path.is_empty() {
        return PathBuf::new();
    }

    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Expands `~` and resolves relative paths against `base_dir`.
#[must_use]
pub fn expand_and_resolve(path: &str, base_dir: &Path) -> PathBuf {
    let expanded = expand(path);
    if expanded.as_os_str().is_empty() || expanded.is_absolute() {
        return expanded;
    }

    base_dir.join(expanded)
}

/// Shortens a path under the home directory to `~/...` for display.
#[must_use]
pub fn collapse_home(path: &Path) -> String {
    dirs::home_dir()
        .and_then(|home| path.strip_prefix(home).ok().map(|rest| Path::new("~").join(rest)))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_empty_and_whitespace() {
        assert_eq!(expand(""), PathBuf::new());
        assert_eq!(expand("   "), PathBuf::new());
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand("~/Pictures/Dynamic");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("Pictures/Dynamic"));
    }

    #[test]
    fn test_expand_keeps_absolute_and_relative() {
        assert_eq!(expand("/srv/walls"), PathBuf::from("/srv/walls"));
        assert_eq!(expand("walls"), PathBuf::from("walls"));
    }

    #[test]
    fn test_expand_and_resolve_relative() {
        let resolved = expand_and_resolve("walls", Path::new("/home/me/.config/heicwall"));
        assert_eq!(resolved, PathBuf::from("/home/me/.config/heicwall/walls"));
    }

    #[test]
    fn test_expand_and_resolve_absolute_and_empty() {
        let base = Path::new("/base");
        assert_eq!(expand_and_resolve("/abs", base), PathBuf::from("/abs"));
        assert_eq!(expand_and_resolve("", base), PathBuf::new());
        assert!(expand_and_resolve("~/x", base).is_absolute());
    }

    #[test]
    fn test_collapse_home() {
        assert_eq!(collapse_home(Path::new("relative/data")), "relative/data");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(collapse_home(&home.join("walls")), format!("~{}walls", std::path::MAIN_SEPARATOR));
        }
    }
}
