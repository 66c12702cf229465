//! Content-addressed definition cache.
//!
//! Each decoded wallpaper is stored as `<root>/<contentHash>/definition.json`.
//! The hash is the storage key and is not repeated inside the file; it is
//! reattached on load. Frames rasterized by the external converter live in the
//! same per-hash directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::model::{
    AppearancePhase, ConstructionError, DefinitionParts, SolarPhase, TimePhase, WallpaperDefinition,
};
use crate::constants::DEFINITION_FILE_NAME;

/// Errors raised by [`DefinitionCache`].
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid cache key `{0}`: expected a hex digest")]
    InvalidKey(String),

    #[error("cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt cache entry {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CacheError {
    fn io(path: &Path, source: io::Error) -> Self { Self::Io { path: path.to_path_buf(), source } }
}

/// On-disk shape of a cached definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub height: u16,
    pub width: u16,
    pub filename: String,
    pub bplist: String,
    pub number_of_frames: u16,
    #[serde(default)]
    pub appearance_phase: Option<AppearancePhase>,
    #[serde(default)]
    pub solar_phases: Option<Vec<SolarPhase>>,
    #[serde(default)]
    pub time_phases: Option<Vec<TimePhase>>,
}

impl From<&WallpaperDefinition> for CacheEntry {
    fn from(definition: &WallpaperDefinition) -> Self {
        Self {
            height: definition.height(),
            width: definition.width(),
            filename: definition.source_filename().to_string(),
            bplist: definition.raw_metadata_blob().to_string(),
            number_of_frames: definition.number_of_frames(),
            appearance_phase: definition.appearance_phase().copied(),
            solar_phases: definition.solar_phases().map(|phases| phases.to_vec()),
            time_phases: definition.time_phases().map(|phases| phases.to_vec()),
        }
    }
}

impl CacheEntry {
    /// Rebuilds the definition, revalidating every invariant.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstructionError`] if the entry is inconsistent.
    pub fn into_definition(self, content_hash: &str) -> Result<WallpaperDefinition, ConstructionError> {
        WallpaperDefinition::new(DefinitionParts {
            content_hash: content_hash.to_string(),
            source_filename: self.filename,
            raw_metadata_blob: self.bplist,
            width: self.width,
            height: self.height,
            number_of_frames: self.number_of_frames,
            appearance_phase: self.appearance_phase,
            solar_phases: self.solar_phases,
            time_phases: self.time_phases,
        })
    }
}

/// Returns `true` if `key` is usable as a cache directory name.
#[must_use]
pub fn is_valid_key(key: &str) -> bool { !key.is_empty() && key.bytes().all(|b| b.is_ascii_hexdigit()) }

/// Definition store rooted at the application data directory.
#[derive(Debug, Clone)]
pub struct DefinitionCache {
    root: PathBuf,
}

impl DefinitionCache {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    #[must_use]
    pub fn root(&self) -> &Path { &self.root }

    /// Directory holding everything stored for `content_hash`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] if the hash is not a hex string.
    pub fn entry_dir(&self, content_hash: &str) -> Result<PathBuf, CacheError> {
        if is_valid_key(content_hash) {
            Ok(self.root.join(content_hash))
        } else {
            Err(CacheError::InvalidKey(content_hash.to_string()))
        }
    }

    /// Path of the serialized definition for `content_hash`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] if the hash is not a hex string.
    pub fn definition_path(&self, content_hash: &str) -> Result<PathBuf, CacheError> {
        Ok(self.entry_dir(content_hash)?.join(DEFINITION_FILE_NAME))
    }

    /// Persists `definition` under its content hash.
    ///
    /// The file is written to a temporary sibling and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid, serialization fails, or the
    /// file cannot be written.
    pub fn store(&self, definition: &WallpaperDefinition) -> Result<(), CacheError> {
        let dir = self.entry_dir(definition.content_hash())?;
        let path = dir.join(DEFINITION_FILE_NAME);
        fs::create_dir_all(&dir).map_err(|err| CacheError::io(&dir, err))?;

        let json = serde_json::to_vec_pretty(&CacheEntry::from(definition))?;
        let mut file = NamedTempFile::new_in(&dir).map_err(|err| CacheError::io(&dir, err))?;
        file.write_all(&json).map_err(|err| CacheError::io(file.path(), err))?;
        file.persist(&path).map_err(|err| CacheError::io(&path, err.error))?;

        tracing::info!(hash = definition.content_hash(), path = %path.display(), "stored wallpaper definition");
        Ok(())
    }

    /// Loads a definition, reporting exactly why an existing entry is unusable.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] when the file exists but cannot be read and
    /// [`CacheError::Corrupt`] when it does not hold a valid definition.
    pub fn try_load(&self, content_hash: &str) -> Result<Option<WallpaperDefinition>, CacheError> {
        let path = self.definition_path(content_hash)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CacheError::io(&path, err)),
        };

        let corrupt = |reason: String| CacheError::Corrupt { path: path.clone(), reason };
        let entry: CacheEntry = serde_json::from_slice(&bytes).map_err(|err| corrupt(err.to_string()))?;
        let definition = entry.into_definition(content_hash).map_err(|err| corrupt(err.to_string()))?;
        Ok(Some(definition))
    }

    /// Loads a definition, treating unreadable or corrupt entries as a miss.
    ///
    /// # Errors
    ///
    /// Only an invalid key is reported; every other failure is logged.
    pub fn load(&self, content_hash: &str) -> Result<Option<WallpaperDefinition>, CacheError> {
        match self.try_load(content_hash) {
            Ok(Some(definition)) => {
                tracing::debug!(hash = content_hash, "definition cache hit");
                Ok(Some(definition))
            }
            Ok(None) => {
                tracing::debug!(hash = content_hash, "definition cache miss");
                Ok(None)
            }
            Err(err @ CacheError::InvalidKey(_)) => Err(err),
            Err(err) => {
                tracing::warn!(hash = content_hash, error = %err, "ignoring unusable cache entry");
                Ok(None)
            }
        }
    }

    /// Returns `true` if a definition file exists for `content_hash`.
    #[must_use]
    pub fn contains(&self, content_hash: &str) -> bool {
        self.definition_path(content_hash).is_ok_and(|path| path.is_file())
    }

    /// Deletes everything stored for `content_hash`.
    ///
    /// Returns `false` if nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the directory cannot be removed.
    pub fn remove(&self, content_hash: &str) -> Result<bool, CacheError> {
        let dir = self.entry_dir(content_hash)?;
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(CacheError::io(&dir, err)),
        }
    }

    /// Sorted list of hashes that have a stored definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache root exists but cannot be listed.
    pub fn hashes(&self) -> Result<Vec<String>, CacheError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(CacheError::io(&self.root, err)),
        };

        let mut hashes: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| self.contains(name))
            .collect();
        hashes.sort();
        Ok(hashes)
    }
}
