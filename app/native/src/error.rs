//! Error types for heicwall.
//!
//! Library modules report their own precise errors; this type collects them
//! at the command-line boundary.

use thiserror::Error;

use crate::bplist::DecodeError;
use crate::wallpaper::{CacheError, DefinitionError};

/// Errors that can occur during command execution.
#[derive(Debug, Error)]
pub enum HeicwallError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Metadata blob could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Tags do not describe a usable dynamic wallpaper.
    #[error("No usable dynamic wallpaper metadata: {0}")]
    Definition(#[from] DefinitionError),
    /// Definition cache operation failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    /// Nothing is stored for the requested hash.
    #[error("No cached definition for {0}")]
    NotCached(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
    /// Generic command error.
    #[error("{0}")]
    Command(String),
}

impl From<std::io::Error> for HeicwallError {
    fn from(err: std::io::Error) -> Self { Self::Io(err.to_string()) }
}

impl From<serde_json::Error> for HeicwallError {
    fn from(err: serde_json::Error) -> Self { Self::Command(err.to_string()) }
}
