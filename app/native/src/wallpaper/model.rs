//! Wallpaper definition data model.
//!
//! A [`WallpaperDefinition`] describes one decoded dynamic wallpaper: its
//! dimensions, how many frames it carries, and which phase sets map an
//! environment to one of those frames. Phase collections are either absent or
//! non-empty; the constructor enforces that and keeps time phases sorted.

use std::fmt;
use std::ops::Deref;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a frame inside a multi-frame source image.
pub type FrameIndex = u16;

/// The three supported ways of choosing a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WallpaperKind {
    /// Light/dark theme driven.
    Appearance,
    /// Sun-position driven.
    Solar,
    /// Clock-time driven.
    Time,
}

impl fmt::Display for WallpaperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Appearance => "appearance",
            Self::Solar => "solar",
            Self::Time => "time",
        };
        f.write_str(name)
    }
}

/// Frame bindings for the light and dark system themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearancePhase {
    pub light_frame_index: FrameIndex,
    pub dark_frame_index: FrameIndex,
}

/// A frame tied to a sun position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarPhase {
    pub frame_index: FrameIndex,
    #[serde(rename = "elevation")]
    pub elevation_degrees: f32,
    #[serde(rename = "azimuth")]
    pub azimuth_degrees: f32,
}

/// A frame that becomes active at a local time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePhase {
    pub frame_index: FrameIndex,
    #[serde(with = "time_of_day")]
    pub time: NaiveTime,
}

/// Parses a local time of day written as `HH:MM:SS`, `HH:MM:SS.fff` or `HH:MM`.
#[must_use]
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text.trim(), format).ok())
}

/// Serde adapter storing a [`NaiveTime`] as `HH:MM:SS`.
mod time_of_day {
    use chrono::NaiveTime;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M:%S"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_time_of_day(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid time of day `{text}`")))
    }
}

/// A sequence holding at least one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NonEmpty<T>(Vec<T>);

impl<T> NonEmpty<T> {
    /// Wraps `items`, or returns `None` when it is empty.
    #[must_use]
    pub fn new(items: Vec<T>) -> Option<Self> {
        if items.is_empty() { None } else { Some(Self(items)) }
    }

    #[must_use]
    pub fn first(&self) -> &T { &self.0[0] }

    #[must_use]
    pub fn last(&self) -> &T { &self.0[self.0.len() - 1] }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> { self.0 }
}

impl<T> Deref for NonEmpty<T> {
    type Target = [T];

    fn deref(&self) -> &[T] { &self.0 }
}

/// One phase set of a definition, borrowed for evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseSet<'a> {
    Time(&'a NonEmpty<TimePhase>),
    Solar(&'a NonEmpty<SolarPhase>),
    Appearance(&'a AppearancePhase),
}

impl PhaseSet<'_> {
    #[must_use]
    pub const fn kind(&self) -> WallpaperKind {
        match self {
            Self::Time(_) => WallpaperKind::Time,
            Self::Solar(_) => WallpaperKind::Solar,
            Self::Appearance(_) => WallpaperKind::Appearance,
        }
    }
}

/// Errors raised when a definition would violate its invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("{0} phase list is present but empty")]
    EmptyPhases(WallpaperKind),

    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u16, height: u16 },

    #[error("{kind} phase references frame {index}, but only {number_of_frames} frames exist")]
    FrameIndexOutOfRange {
        kind: WallpaperKind,
        index: FrameIndex,
        number_of_frames: u16,
    },

    #[error("solar phase for frame {frame_index} has a non-finite elevation or azimuth")]
    NonFiniteSolarPosition { frame_index: FrameIndex },
}

/// Raw inputs for [`WallpaperDefinition::new`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionParts {
    pub content_hash: String,
    pub source_filename: String,
    pub raw_metadata_blob: String,
    pub width: u16,
    pub height: u16,
    pub number_of_frames: u16,
    pub appearance_phase: Option<AppearancePhase>,
    pub solar_phases: Option<Vec<SolarPhase>>,
    pub time_phases: Option<Vec<TimePhase>>,
}

/// An immutable, validated dynamic wallpaper description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperDefinition {
    content_hash: String,
    source_filename: String,
    raw_metadata_blob: String,
    width: u16,
    height: u16,
    number_of_frames: u16,
    appearance_phase: Option<AppearancePhase>,
    solar_phases: Option<NonEmpty<SolarPhase>>,
    time_phases: Option<NonEmpty<TimePhase>>,
}

impl WallpaperDefinition {
    /// Validates `parts` and builds a definition.
    ///
    /// Time phases are stably sorted by time of day; solar phases keep their
    /// source order.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstructionError`] for zero dimensions, a present but
    /// empty phase list, a frame index outside `0..number_of_frames`, or a
    /// solar phase whose elevation or azimuth is not finite.
    pub fn new(parts: DefinitionParts) -> Result<Self, ConstructionError> {
        let DefinitionParts {
            content_hash,
            source_filename,
            raw_metadata_blob,
            width,
            height,
            number_of_frames,
            appearance_phase,
            solar_phases,
            time_phases,
        } = parts;

        if width == 0 || height == 0 {
            return Err(ConstructionError::InvalidDimensions { width, height });
        }

        let check = |kind: WallpaperKind, index: FrameIndex| {
            if index < number_of_frames {
                Ok(())
            } else {
                Err(ConstructionError::FrameIndexOutOfRange { kind, index, number_of_frames })
            }
        };

        if let Some(phase) = &appearance_phase {
            check(WallpaperKind::Appearance, phase.light_frame_index)?;
            check(WallpaperKind::Appearance, phase.dark_frame_index)?;
        }

        let solar_phases = match solar_phases {
            Some(phases) => {
                for phase in &phases {
                    check(WallpaperKind::Solar, phase.frame_index)?;
                    if !phase.elevation_degrees.is_finite() || !phase.azimuth_degrees.is_finite() {
                        return Err(ConstructionError::NonFiniteSolarPosition { frame_index: phase.frame_index });
                    }
                }
                Some(NonEmpty::new(phases).ok_or(ConstructionError::EmptyPhases(WallpaperKind::Solar))?)
            }
            None => None,
        };

        let time_phases = match time_phases {
            Some(mut phases) => {
                for phase in &phases {
                    check(WallpaperKind::Time, phase.frame_index)?;
                }
                phases.sort_by_key(|phase| phase.time);
                Some(NonEmpty::new(phases).ok_or(ConstructionError::EmptyPhases(WallpaperKind::Time))?)
            }
            None => None,
        };

        Ok(Self {
            content_hash,
            source_filename,
            raw_metadata_blob,
            width,
            height,
            number_of_frames,
            appearance_phase,
            solar_phases,
            time_phases,
        })
    }

    #[must_use]
    pub fn content_hash(&self) -> &str { &self.content_hash }

    #[must_use]
    pub fn source_filename(&self) -> &str { &self.source_filename }

    #[must_use]
    pub fn raw_metadata_blob(&self) -> &str { &self.raw_metadata_blob }

    #[must_use]
    pub const fn width(&self) -> u16 { self.width }

    #[must_use]
    pub const fn height(&self) -> u16 { self.height }

    #[must_use]
    pub const fn number_of_frames(&self) -> u16 { self.number_of_frames }

    #[must_use]
    pub const fn appearance_phase(&self) -> Option<&AppearancePhase> { self.appearance_phase.as_ref() }

    #[must_use]
    pub const fn solar_phases(&self) -> Option<&NonEmpty<SolarPhase>> { self.solar_phases.as_ref() }

    /// Time phases, sorted ascending by time of day.
    #[must_use]
    pub const fn time_phases(&self) -> Option<&NonEmpty<TimePhase>> { self.time_phases.as_ref() }

    #[must_use]
    pub const fn has_appearance_phase(&self) -> bool { self.appearance_phase.is_some() }

    #[must_use]
    pub const fn has_solar_phases(&self) -> bool { self.solar_phases.is_some() }

    #[must_use]
    pub const fn has_time_phases(&self) -> bool { self.time_phases.is_some() }

    /// Kinds carried by this wallpaper, in evaluation priority order.
    #[must_use]
    pub fn kinds(&self) -> Vec<WallpaperKind> { self.phase_sets().map(|set| set.kind()).collect() }

    /// Present phase sets in evaluation priority order: time, solar, appearance.
    pub fn phase_sets(&self) -> impl Iterator<Item = PhaseSet<'_>> {
        let time = self.time_phases.as_ref().map(PhaseSet::Time);
        let solar = self.solar_phases.as_ref().map(PhaseSet::Solar);
        let appearance = self.appearance_phase.as_ref().map(PhaseSet::Appearance);
        [time, solar, appearance].into_iter().flatten()
    }

    /// Returns the same definition stored under another content hash.
    #[must_use]
    pub fn with_content_hash(mut self, content_hash: impl Into<String>) -> Self {
        self.content_hash = content_hash.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveTime { NaiveTime::from_hms_opt(hour, minute, 0).unwrap() }

    fn time_phase(frame_index: FrameIndex, hour: u32) -> TimePhase {
        TimePhase { frame_index, time: at(hour, 0) }
    }

    fn parts() -> DefinitionParts {
        DefinitionParts {
            content_hash: "abc123".to_string(),
            source_filename: "Mojave.heic".to_string(),
            raw_metadata_blob: "YnBsaXN0MDA=".to_string(),
            width: 5120,
            height: 2880,
            number_of_frames: 3,
            ..DefinitionParts::default()
        }
    }

    // ========================================================================
    // Construction
    // ========================================================================

    #[test]
    fn test_definition_without_phases() {
        let definition = WallpaperDefinition::new(parts()).unwrap();
        assert!(!definition.has_appearance_phase());
        assert!(!definition.has_solar_phases());
        assert!(!definition.has_time_phases());
        assert!(definition.kinds().is_empty());
        assert_eq!(definition.content_hash(), "abc123");
        assert_eq!(definition.source_filename(), "Mojave.heic");
    }

    #[test]
    fn test_time_phases_are_sorted() {
        let definition = WallpaperDefinition::new(DefinitionParts {
            time_phases: Some(vec![time_phase(0, 6), time_phase(1, 0), time_phase(2, 18)]),
            ..parts()
        })
        .unwrap();

        let frames: Vec<_> = definition.time_phases().unwrap().iter().map(|p| p.frame_index).collect();
        assert_eq!(frames, vec![1, 0, 2]);
    }

    #[test]
    fn test_time_sort_is_stable_for_equal_times() {
        let definition = WallpaperDefinition::new(DefinitionParts {
            time_phases: Some(vec![time_phase(2, 12), time_phase(0, 12), time_phase(1, 6)]),
            ..parts()
        })
        .unwrap();

        let frames: Vec<_> = definition.time_phases().unwrap().iter().map(|p| p.frame_index).collect();
        assert_eq!(frames, vec![1, 2, 0]);
    }

    #[test]
    fn test_solar_phases_keep_source_order() {
        let phases = vec![
            SolarPhase { frame_index: 2, elevation_degrees: 10.0, azimuth_degrees: 100.0 },
            SolarPhase { frame_index: 0, elevation_degrees: -9.0, azimuth_degrees: 80.0 },
        ];
        let definition = WallpaperDefinition::new(DefinitionParts {
            solar_phases: Some(phases.clone()),
            ..parts()
        })
        .unwrap();

        assert_eq!(&**definition.solar_phases().unwrap(), phases.as_slice());
    }

    #[test]
    fn test_empty_phase_lists_are_rejected() {
        let err = WallpaperDefinition::new(DefinitionParts { time_phases: Some(vec![]), ..parts() }).unwrap_err();
        assert_eq!(err, ConstructionError::EmptyPhases(WallpaperKind::Time));

        let err = WallpaperDefinition::new(DefinitionParts { solar_phases: Some(vec![]), ..parts() }).unwrap_err();
        assert_eq!(err, ConstructionError::EmptyPhases(WallpaperKind::Solar));
    }

    #[test]
    fn test_zero_dimensions_are_rejected() {
        let err = WallpaperDefinition::new(DefinitionParts { width: 0, ..parts() }).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidDimensions { width: 0, .. }));
    }

    #[test]
    fn test_out_of_range_frame_is_rejected() {
        let err = WallpaperDefinition::new(DefinitionParts {
            appearance_phase: Some(AppearancePhase { light_frame_index: 0, dark_frame_index: 3 }),
            ..parts()
        })
        .unwrap_err();

        assert_eq!(
            err,
            ConstructionError::FrameIndexOutOfRange {
                kind: WallpaperKind::Appearance,
                index: 3,
                number_of_frames: 3,
            }
        );
    }

    #[test]
    fn test_non_finite_solar_position_is_rejected() {
        for (elevation_degrees, azimuth_degrees) in [(f32::NAN, 0.0), (0.0, f32::INFINITY), (f32::NEG_INFINITY, 0.0)] {
            let err = WallpaperDefinition::new(DefinitionParts {
                solar_phases: Some(vec![
                    SolarPhase { frame_index: 0, elevation_degrees: 10.0, azimuth_degrees: 90.0 },
                    SolarPhase { frame_index: 2, elevation_degrees, azimuth_degrees },
                ]),
                ..parts()
            })
            .unwrap_err();
            assert_eq!(err, ConstructionError::NonFiniteSolarPosition { frame_index: 2 });
        }
    }

    // ========================================================================
    // Phase sets
    // ========================================================================

    #[test]
    fn test_phase_sets_follow_priority_order() {
        let definition = WallpaperDefinition::new(DefinitionParts {
            appearance_phase: Some(AppearancePhase { light_frame_index: 0, dark_frame_index: 1 }),
            time_phases: Some(vec![time_phase(0, 6)]),
            ..parts()
        })
        .unwrap();

        assert_eq!(definition.kinds(), vec![WallpaperKind::Time, WallpaperKind::Appearance]);
        assert!(matches!(definition.phase_sets().next(), Some(PhaseSet::Time(_))));
    }

    #[test]
    fn test_non_empty_accessors() {
        let items = NonEmpty::new(vec![1, 2, 3]).unwrap();
        assert_eq!(*items.first(), 1);
        assert_eq!(*items.last(), 3);
        assert_eq!(items.len(), 3);
        assert!(NonEmpty::<u8>::new(Vec::new()).is_none());
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    #[test]
    fn test_time_phase_serializes_as_clock_time() {
        let json = serde_json::to_value(TimePhase { frame_index: 4, time: at(18, 30) }).unwrap();
        assert_eq!(json, serde_json::json!({ "frameIndex": 4, "time": "18:30:00" }));
    }

    #[test]
    fn test_time_phase_accepts_short_and_fractional_times() {
        let short: TimePhase = serde_json::from_str(r#"{"frameIndex":1,"time":"07:15"}"#).unwrap();
        assert_eq!(short.time, at(7, 15));

        let fractional: TimePhase = serde_json::from_str(r#"{"frameIndex":1,"time":"07:15:00.000"}"#).unwrap();
        assert_eq!(fractional.time, at(7, 15));

        assert!(serde_json::from_str::<TimePhase>(r#"{"frameIndex":1,"time":"25:00"}"#).is_err());
    }

    #[test]
    fn test_solar_phase_field_names() {
        let phase = SolarPhase { frame_index: 1, elevation_degrees: -25.0, azimuth_degrees: 70.0 };
        let json = serde_json::to_value(phase).unwrap();
        assert_eq!(json["elevation"], -25.0);
        assert_eq!(json["azimuth"], 70.0);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(WallpaperKind::Appearance.to_string(), "appearance");
        assert_eq!(WallpaperKind::Time.to_string(), "time");
    }
}
