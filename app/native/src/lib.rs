//! Heicwall - dynamic HEIC wallpaper metadata decoding and frame selection.
//!
//! The library decodes the binary property lists embedded in dynamic
//! wallpapers, turns them into validated [`wallpaper::WallpaperDefinition`]s,
//! caches those per content hash, and picks the frame to show for a given
//! time and theme. The `heicwall` binary exposes it through [`cli`].

pub mod bplist;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod platform;
pub mod schema;
pub mod wallpaper;
