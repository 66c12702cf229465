//! Assembles a [`WallpaperDefinition`] from extracted image tags.
//!
//! The raw tags come from an external metadata extractor (exiftool-style JSON
//! output). Only the handful of tags below are consulted.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::de::Error as _;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::mapper::{self, MappingError};
use super::model::{ConstructionError, DefinitionParts, WallpaperDefinition};
use crate::bplist::{self, DecodeError};

pub const IMAGE_WIDTH: &str = "ImageWidth";
pub const IMAGE_HEIGHT: &str = "ImageHeight";
pub const META_IMAGE_SIZE: &str = "MetaImageSize";
pub const SOLAR: &str = "Solar";
pub const H24: &str = "H24";
pub const APR: &str = "Apr";

/// Errors raised while turning a tag map into a definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("missing tag `{0}`")]
    MissingTag(&'static str),

    #[error("tag `{tag}` has an invalid value `{value}`")]
    InvalidTag { tag: &'static str, value: String },

    #[error("frame {frame} is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSizeMismatch {
        frame: usize,
        width: u16,
        height: u16,
        expected_width: u16,
        expected_height: u16,
    },

    #[error("no Solar, H24 or Apr metadata")]
    NoDynamicMetadata,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

/// Tag name to string value, as reported by the metadata extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap(BTreeMap<String, String>);

impl TagMap {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.0.insert(tag.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&str> { self.0.get(tag).map(String::as_str) }

    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Parses extractor JSON output.
    ///
    /// Accepts a single object or an array whose first element is the object
    /// (`exiftool -j`). Group prefixes such as `XMP:` are dropped, numbers and
    /// booleans are stringified, and nested values are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error when the text is not JSON or holds no object.
    pub fn from_extractor_json(text: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let object = match &value {
            serde_json::Value::Array(items) => items.first().and_then(serde_json::Value::as_object),
            other => other.as_object(),
        }
        .ok_or_else(|| serde_json::Error::custom("expected a JSON object of tags"))?;

        let mut tags = Self::new();
        for (name, value) in object {
            let tag = name.rsplit(':').next().unwrap_or(name);
            let text = match value {
                serde_json::Value::String(text) => text.clone(),
                serde_json::Value::Number(number) => number.to_string(),
                serde_json::Value::Bool(flag) => flag.to_string(),
                _ => continue,
            };
            tags.insert(tag, text);
        }
        Ok(tags)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(tag, value)| (tag.into(), value.into())).collect())
    }
}

/// Builds a definition from extracted tags.
///
/// The `Solar` tag wins over `H24`, which wins over `Apr`. Solar and time
/// blobs may also embed an appearance fallback; an `Apr` blob must.
///
/// # Errors
///
/// Returns a [`DefinitionError`] when a required tag is missing or invalid,
/// a frame has different dimensions than the image, or the chosen blob fails
/// to decode, map or validate.
pub fn decode_definition(
    tags: &TagMap,
    content_hash: impl Into<String>,
    source_filename: impl Into<String>,
) -> Result<WallpaperDefinition, DefinitionError> {
    let width = dimension(tags, IMAGE_WIDTH)?;
    let height = dimension(tags, IMAGE_HEIGHT)?;
    let number_of_frames = frame_count(tags, width, height)?;

    let (tag, blob) = [SOLAR, H24, APR]
        .into_iter()
        .find_map(|tag| tags.get(tag).map(|blob| (tag, blob)))
        .ok_or(DefinitionError::NoDynamicMetadata)?;
    let root = bplist::decode_base64(blob)?;

    let mut parts = DefinitionParts {
        content_hash: content_hash.into(),
        source_filename: source_filename.into(),
        raw_metadata_blob: blob.to_string(),
        width,
        height,
        number_of_frames,
        ..DefinitionParts::default()
    };
    match tag {
        SOLAR => {
            parts.solar_phases = Some(mapper::map_solar(&root, number_of_frames)?);
            parts.appearance_phase = mapper::map_optional_appearance(&root, number_of_frames)?;
        }
        H24 => {
            parts.time_phases = Some(mapper::map_time(&root, number_of_frames)?);
            parts.appearance_phase = mapper::map_optional_appearance(&root, number_of_frames)?;
        }
        _ => parts.appearance_phase = Some(mapper::map_appearance(&root, number_of_frames)?),
    }

    Ok(WallpaperDefinition::new(parts)?)
}

fn dimension(tags: &TagMap, tag: &'static str) -> Result<u16, DefinitionError> {
    let value = tags.get(tag).ok_or(DefinitionError::MissingTag(tag))?;
    value
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|&size| size > 0)
        .ok_or_else(|| DefinitionError::InvalidTag { tag, value: value.to_string() })
}

/// Counts the frames declared by `MetaImageSize` (`x y w h` per frame).
fn frame_count(tags: &TagMap, width: u16, height: u16) -> Result<u16, DefinitionError> {
    let Some(value) = tags.get(META_IMAGE_SIZE) else {
        return Ok(0);
    };
    let invalid = || DefinitionError::InvalidTag { tag: META_IMAGE_SIZE, value: value.to_string() };

    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.len() % 4 != 0 {
        return Err(invalid());
    }

    for (frame, group) in tokens.chunks_exact(4).enumerate() {
        let frame_width = group[2].parse::<u16>().map_err(|_| invalid())?;
        let frame_height = group[3].parse::<u16>().map_err(|_| invalid())?;
        if frame_width != width || frame_height != height {
            return Err(DefinitionError::FrameSizeMismatch {
                frame,
                width: frame_width,
                height: frame_height,
                expected_width: width,
                expected_height: height,
            });
        }
    }

    u16::try_from(tokens.len() / 4).map_err(|_| invalid())
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String { to_hex(&Sha256::digest(bytes)) }

/// Lowercase hex SHA-256 of a file's contents, read in chunks.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(to_hex(&hasher.finalize()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
