//! Dynamic wallpaper decoding and frame selection.
//!
//! The pipeline runs leaf to root:
//!
//! 1. [`metadata`] picks the metadata blob out of the extracted tags.
//! 2. [`crate::bplist`] decodes it into a generic value tree.
//! 3. [`mapper`] turns the tree into typed phases.
//! 4. [`model`] validates them into a [`WallpaperDefinition`].
//! 5. [`cache`] persists the definition by content hash.
//! 6. [`evaluator`] picks a frame for the current environment.
//!
//! [`library`] ties the steps together for a whole folder.

pub mod cache;
pub mod evaluator;
pub mod library;
pub mod mapper;
pub mod metadata;
pub mod model;

pub use cache::{CacheEntry, CacheError, DefinitionCache};
pub use evaluator::{CurrentEnvironment, evaluate};
pub use library::{MetadataSource, ScanReport, SidecarMetadata, WallpaperLibrary, frame_path};
pub use mapper::MappingError;
pub use metadata::{DefinitionError, TagMap, decode_definition};
pub use model::{
    AppearancePhase, ConstructionError, DefinitionParts, FrameIndex, NonEmpty, PhaseSet, SolarPhase,
    TimePhase, WallpaperDefinition, WallpaperKind,
};
