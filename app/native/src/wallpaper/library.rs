//! Wallpaper folder discovery and batch loading.
//!
//! A scan hashes every `.heic` file in a folder, reuses cached definitions
//! where possible, and decodes the rest from their extracted metadata. Files
//! are processed in parallel; one bad file never aborts the batch.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use natord::compare;
use rayon::prelude::*;
use thiserror::Error;

use super::cache::{CacheError, DefinitionCache};
use super::metadata::{self, DefinitionError, TagMap};
use super::model::{FrameIndex, WallpaperDefinition};

/// Extensions treated as dynamic wallpaper sources.
const HEIC_EXTENSIONS: &[&str] = &["heic"];

/// Errors raised while loading a single wallpaper file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid metadata for {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Supplies the raw tags of an image, standing in for the metadata extractor.
pub trait MetadataSource: Send + Sync {
    /// Returns the tags of `image`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when the tags cannot be obtained.
    fn read_tags(&self, image: &Path) -> Result<TagMap, LoadError>;
}

/// Reads extractor JSON saved next to each image as `<file>.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarMetadata;

impl SidecarMetadata {
    /// Returns the sidecar location for `image` (`Mojave.heic` -> `Mojave.heic.json`).
    #[must_use]
    pub fn sidecar_path(image: &Path) -> PathBuf {
        let mut name = image.file_name().unwrap_or_default().to_os_string();
        name.push(".json");
        image.with_file_name(name)
    }
}

impl MetadataSource for SidecarMetadata {
    fn read_tags(&self, image: &Path) -> Result<TagMap, LoadError> {
        let path = Self::sidecar_path(image);
        let text = fs::read_to_string(&path).map_err(|source| LoadError::Io { path: path.clone(), source })?;
        TagMap::from_extractor_json(&text).map_err(|source| LoadError::Metadata { path, source })
    }
}

/// Returns `true` if the path has a `.heic` extension (case-insensitive).
#[must_use]
pub fn is_heic_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| HEIC_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Lists the `.heic` files of a directory in natural order.
#[must_use]
pub fn list_heic_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_heic_file(path))
        .collect();
    files.sort_by(|a, b| compare(a.to_string_lossy().as_ref(), b.to_string_lossy().as_ref()));
    files
}

/// Location of a rasterized frame inside the data directory.
#[must_use]
pub fn frame_path(data_dir: &Path, content_hash: &str, frame: FrameIndex) -> PathBuf {
    data_dir.join(content_hash).join(format!("frame-{frame}.jpg"))
}

/// A definition together with the file it was loaded for.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedWallpaper {
    pub path: PathBuf,
    pub definition: WallpaperDefinition,
    pub from_cache: bool,
}

/// A file that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of [`WallpaperLibrary::scan`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub wallpapers: Vec<LoadedWallpaper>,
    pub failures: Vec<LoadFailure>,
}

impl ScanReport {
    #[must_use]
    pub fn cache_hits(&self) -> usize { self.wallpapers.iter().filter(|w| w.from_cache).count() }
}

/// Loads definitions through the cache, decoding only on a miss.
#[derive(Debug, Clone)]
pub struct WallpaperLibrary<S = SidecarMetadata> {
    cache: DefinitionCache,
    source: S,
}

impl<S: MetadataSource> WallpaperLibrary<S> {
    #[must_use]
    pub const fn new(cache: DefinitionCache, source: S) -> Self { Self { cache, source } }

    #[must_use]
    pub const fn cache(&self) -> &DefinitionCache { &self.cache }

    /// Loads one file: cache hit by content hash, else decode and store.
    ///
    /// A failed store is logged and does not fail the load.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when the file cannot be hashed, its tags cannot
    /// be read, or they do not describe a dynamic wallpaper.
    pub fn load_file(&self, path: &Path) -> Result<LoadedWallpaper, LoadError> {
        let hash = metadata::hash_file(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;

        if let Some(definition) = self.cache.load(&hash)? {
            return Ok(LoadedWallpaper { path: path.to_path_buf(), definition, from_cache: true });
        }

        let tags = self.source.read_tags(path)?;
        let filename = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        let definition = metadata::decode_definition(&tags, hash, filename)?;

        if let Err(err) = self.cache.store(&definition) {
            tracing::warn!(path = %path.display(), error = %err, "failed to cache wallpaper definition");
        }

        Ok(LoadedWallpaper { path: path.to_path_buf(), definition, from_cache: false })
    }

    /// Loads every `.heic` file in `dir` in parallel.
    #[must_use]
    pub fn scan(&self, dir: &Path) -> ScanReport {
        let files = list_heic_files(dir);
        let results: Vec<_> = files.par_iter().map(|path| (path, self.load_file(path))).collect();

        let mut report = ScanReport::default();
        for (path, result) in results {
            match result {
                Ok(wallpaper) => report.wallpapers.push(wallpaper),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping wallpaper");
                    report.failures.push(LoadFailure { path: path.clone(), message: err.to_string() });
                }
            }
        }

        tracing::info!(
            dir = %dir.display(),
            loaded = report.wallpapers.len(),
            cached = report.cache_hits(),
            failed = report.failures.len(),
            "scanned wallpaper folder"
        );
        report
    }
}
