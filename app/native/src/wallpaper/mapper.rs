//! Maps a decoded property list onto typed wallpaper phases.
//!
//! Key names follow the metadata Apple embeds in dynamic HEIC files:
//!
//! | Key  | Meaning                                   |
//! |------|-------------------------------------------|
//! | `l`  | light frame index                         |
//! | `d`  | dark frame index                          |
//! | `ap` | nested appearance dictionary              |
//! | `si` | solar phase list (`i`, `a`, `z`)          |
//! | `ti` | time phase list (`i`, `t`)                |
//!
//! Every accessor validates eagerly, so a partially valid blob never yields a
//! partially built phase list.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use thiserror::Error;

use super::model::{AppearancePhase, FrameIndex, SolarPhase, TimePhase};
use crate::bplist::Value;

const ROOT: &str = "<root>";
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Errors raised when a value tree does not describe a known wallpaper kind.
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("missing key `{0}`")]
    MissingKey(String),

    #[error("key `{0}` has an unexpected type")]
    WrongType(String),

    #[error("frame index {index} is out of range for {number_of_frames} frames")]
    FrameIndexOutOfRange { index: i64, number_of_frames: u16 },

    #[error("time value {0} is not a fraction of a day in [0, 1]")]
    InvalidTime(f64),

    #[error("key `{key}` is not a finite angle: {value}")]
    InvalidCoordinate { key: String, value: f64 },
}

type Dictionary = BTreeMap<String, Value>;

/// Reads the appearance phase from `l`/`d` on the root, or from the nested
/// `ap` dictionary when the root carries neither.
///
/// # Errors
///
/// Returns a [`MappingError`] for a missing or mistyped key or an out-of-range
/// frame index.
pub fn map_appearance(root: &Value, number_of_frames: u16) -> Result<AppearancePhase, MappingError> {
    let root = dictionary(root, ROOT)?;
    let source = if !root.contains_key("l") && !root.contains_key("d") {
        match root.get("ap") {
            Some(nested) => dictionary(nested, "ap")?,
            None => root,
        }
    } else {
        root
    };

    Ok(AppearancePhase {
        light_frame_index: frame_index(source, "l", number_of_frames)?,
        dark_frame_index: frame_index(source, "d", number_of_frames)?,
    })
}

/// Like [`map_appearance`], but returns `Ok(None)` when the blob carries no
/// appearance keys at all. Solar and time blobs only optionally embed one.
///
/// # Errors
///
/// Returns a [`MappingError`] when appearance keys exist but are invalid.
pub fn map_optional_appearance(
    root: &Value,
    number_of_frames: u16,
) -> Result<Option<AppearancePhase>, MappingError> {
    let map = dictionary(root, ROOT)?;
    if ["l", "d", "ap"].iter().any(|key| map.contains_key(*key)) {
        map_appearance(root, number_of_frames).map(Some)
    } else {
        Ok(None)
    }
}

/// Reads the solar phase list under `si`, in source order.
///
/// # Errors
///
/// Returns a [`MappingError`] for a missing or mistyped key, an out-of-range
/// frame index, or a coordinate that is not finite once narrowed to `f32`.
pub fn map_solar(root: &Value, number_of_frames: u16) -> Result<Vec<SolarPhase>, MappingError> {
    entries(root, "si")?
        .iter()
        .map(|entry| {
            let entry = dictionary(entry, "si")?;
            Ok(SolarPhase {
                frame_index: frame_index(entry, "i", number_of_frames)?,
                elevation_degrees: coordinate(entry, "a")?,
                azimuth_degrees: coordinate(entry, "z")?,
            })
        })
        .collect()
}

/// Reads the time phase list under `ti`, in source order.
///
/// # Errors
///
/// Returns a [`MappingError`] for a missing or mistyped key, an out-of-range
/// frame index, or a time value outside `[0, 1]`.
pub fn map_time(root: &Value, number_of_frames: u16) -> Result<Vec<TimePhase>, MappingError> {
    entries(root, "ti")?
        .iter()
        .map(|entry| {
            let entry = dictionary(entry, "ti")?;
            Ok(TimePhase {
                frame_index: frame_index(entry, "i", number_of_frames)?,
                time: time_from_day_fraction(number(entry, "t")?)?,
            })
        })
        .collect()
}

/// Converts a fraction of a day into a local time, rounding to the second.
///
/// `1.0` wraps to midnight rather than producing `24:00:00`.
///
/// # Errors
///
/// Returns [`MappingError::InvalidTime`] for non-finite values or values
/// outside `[0, 1]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn time_from_day_fraction(fraction: f64) -> Result<NaiveTime, MappingError> {
    if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
        return Err(MappingError::InvalidTime(fraction));
    }

    let seconds = (fraction * SECONDS_PER_DAY).round() as u32 % 86_400;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).ok_or(MappingError::InvalidTime(fraction))
}

fn dictionary<'a>(value: &'a Value, name: &str) -> Result<&'a Dictionary, MappingError> {
    value.as_dictionary().ok_or_else(|| MappingError::WrongType(name.to_string()))
}

fn field<'a>(map: &'a Dictionary, key: &str) -> Result<&'a Value, MappingError> {
    map.get(key).ok_or_else(|| MappingError::MissingKey(key.to_string()))
}

fn entries<'a>(root: &'a Value, key: &str) -> Result<&'a [Value], MappingError> {
    field(dictionary(root, ROOT)?, key)?
        .as_array()
        .ok_or_else(|| MappingError::WrongType(key.to_string()))
}

fn number(map: &Dictionary, key: &str) -> Result<f64, MappingError> {
    field(map, key)?
        .as_number()
        .ok_or_else(|| MappingError::WrongType(key.to_string()))
}

#[allow(clippy::cast_possible_truncation)]
fn coordinate(map: &Dictionary, key: &str) -> Result<f32, MappingError> {
    let value = number(map, key)?;
    let degrees = value as f32;
    if degrees.is_finite() {
        Ok(degrees)
    } else {
        Err(MappingError::InvalidCoordinate { key: key.to_string(), value })
    }
}

fn frame_index(map: &Dictionary, key: &str, number_of_frames: u16) -> Result<FrameIndex, MappingError> {
    let index = field(map, key)?
        .as_integer()
        .ok_or_else(|| MappingError::WrongType(key.to_string()))?;

    FrameIndex::try_from(index)
        .ok()
        .filter(|&frame| frame < number_of_frames)
        .ok_or(MappingError::FrameIndexOutOfRange { index, number_of_frames })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bplist::decode_base64;

    const APPEARANCE: &str = "YnBsaXN0MDDSAQIDBFFkUWwQARAACA0PERMAAAAAAAABAQAAAAAAAAAFAAAAAAAAAAAAAAAAAAAAFQ==";
    const TIME: &str = "YnBsaXN0MDDSAQIDD1J0aVJhcKMECQzSBQYHCFF0UWkjP9AAAAAAAAAQANIFBgoLIwAAAAAAAAAAEAHSBQYNDiM/6AAAAAAAABAC0hARDghRZFFsCA0QExccHiApKzA5O0BJS1BSAAAAAAAAAQEAAAAAAAAAEgAAAAAAAAAAAAAAAAAAAFQ=";
    const SOLAR_INT_COORDS: &str = "YnBsaXN0MDDTAQIDBAUGUWRRbFJzaRAAEAGiBw3TCAkKCwQMUWFRaVF6E//////////2EFrTCAkKDgUPI0BGwAAAAAAAELQIDxETFhgaHSQmKCozNTxFAAAAAAAAAQEAAAAAAAAAEAAAAAAAAAAAAAAAAAAAAEc=";
    const TIME_REAL_INDEX: &str = "YnBsaXN0MDDRAQJSdGmhA9IEBQYHUWlRdCMAAAAAAAAAACM/4AAAAAAAAAgLDhAVFxkiAAAAAAAAAQEAAAAAAAAACAAAAAAAAAAAAAAAAAAAACs=";
    const TIME_OUT_OF_RANGE: &str = "YnBsaXN0MDDRAQJSdGmhA9IEBQYHUWlRdBAAIz/4AAAAAAAACAsOEBUXGRsAAAAAAAABAQAAAAAAAAAIAAAAAAAAAAAAAAAAAAAAJA==";
    const TIME_WRAP_ONE: &str = "YnBsaXN0MDDRAQJSdGmiAwjSBAUGB1FpUXQQACM/8AAAAAAAANIEBQkKEAEjP+AAAAAAAAAICw4RFhgaHCUqLAAAAAAAAAEBAAAAAAAAAAsAAAAAAAAAAAAAAAAAAAA1";
    const SOLAR_MISSING_AZIMUTH: &str = "YnBsaXN0MDDRAQJSc2mhA9IEBQYHUWFRaSM/8AAAAAAAABAACAsOEBUXGSIAAAAAAAABAQAAAAAAAAAIAAAAAAAAAAAAAAAAAAAAJA==";
    const ARRAY_ROOT: &str = "YnBsaXN0MDCjAQIDEAEQAhADCAwOEAAAAAAAAAEBAAAAAAAAAAQAAAAAAAAAAAAAAAAAAAAS";

    fn value(text: &str) -> Value { decode_base64(text).unwrap() }

    fn hms(hour: u32, minute: u32, second: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, second).unwrap()
    }

    // ========================================================================
    // Appearance
    // ========================================================================

    #[test]
    fn test_map_appearance_from_root() {
        let phase = map_appearance(&value(APPEARANCE), 2).unwrap();
        assert_eq!(phase, AppearancePhase { light_frame_index: 0, dark_frame_index: 1 });
    }

    #[test]
    fn test_map_appearance_from_nested_dictionary() {
        let phase = map_appearance(&value(TIME), 3).unwrap();
        assert_eq!(phase, AppearancePhase { light_frame_index: 0, dark_frame_index: 2 });
    }

    #[test]
    fn test_map_appearance_rejects_out_of_range_frame() {
        let err = map_appearance(&value(APPEARANCE), 1).unwrap_err();
        assert_eq!(err, MappingError::FrameIndexOutOfRange { index: 1, number_of_frames: 1 });
    }

    #[test]
    fn test_map_appearance_missing_keys() {
        let err = map_appearance(&value(TIME_WRAP_ONE), 2).unwrap_err();
        assert_eq!(err, MappingError::MissingKey("l".to_string()));
    }

    #[test]
    fn test_map_appearance_rejects_non_dictionary_root() {
        let err = map_appearance(&value(ARRAY_ROOT), 2).unwrap_err();
        assert_eq!(err, MappingError::WrongType("<root>".to_string()));
    }

    #[test]
    fn test_map_optional_appearance() {
        assert_eq!(map_optional_appearance(&value(TIME_WRAP_ONE), 2).unwrap(), None);
        assert_eq!(
            map_optional_appearance(&value(SOLAR_INT_COORDS), 2).unwrap(),
            Some(AppearancePhase { light_frame_index: 1, dark_frame_index: 0 })
        );
        assert!(map_optional_appearance(&value(TIME), 2).is_err());
    }

    // ========================================================================
    // Solar
    // ========================================================================

    #[test]
    fn test_map_solar_coerces_integer_coordinates() {
        let phases = map_solar(&value(SOLAR_INT_COORDS), 2).unwrap();
        assert_eq!(
            phases,
            vec![
                SolarPhase { frame_index: 0, elevation_degrees: -10.0, azimuth_degrees: 90.0 },
                SolarPhase { frame_index: 1, elevation_degrees: 45.5, azimuth_degrees: 180.0 },
            ]
        );
    }

    #[test]
    fn test_map_solar_missing_azimuth() {
        let err = map_solar(&value(SOLAR_MISSING_AZIMUTH), 2).unwrap_err();
        assert_eq!(err, MappingError::MissingKey("z".to_string()));
    }

    #[test]
    fn test_map_solar_missing_list() {
        let err = map_solar(&value(APPEARANCE), 2).unwrap_err();
        assert_eq!(err, MappingError::MissingKey("si".to_string()));
    }

    #[test]
    fn test_map_solar_rejects_out_of_range_frame() {
        let err = map_solar(&value(SOLAR_INT_COORDS), 1).unwrap_err();
        assert_eq!(err, MappingError::FrameIndexOutOfRange { index: 1, number_of_frames: 1 });
    }

    fn solar_entry(elevation: f64, azimuth: f64) -> Value {
        let entry = Value::Dictionary(BTreeMap::from([
            ("i".to_string(), Value::Integer(0)),
            ("a".to_string(), Value::Real(elevation)),
            ("z".to_string(), Value::Real(azimuth)),
        ]));
        Value::Dictionary(BTreeMap::from([("si".to_string(), Value::Array(vec![entry]))]))
    }

    #[test]
    fn test_map_solar_rejects_coordinate_overflowing_f32() {
        let err = map_solar(&solar_entry(1e40, 90.0), 1).unwrap_err();
        assert_eq!(err, MappingError::InvalidCoordinate { key: "a".to_string(), value: 1e40 });
    }

    #[test]
    fn test_map_solar_rejects_non_finite_coordinates() {
        let err = map_solar(&solar_entry(10.0, f64::INFINITY), 1).unwrap_err();
        assert_eq!(err, MappingError::InvalidCoordinate { key: "z".to_string(), value: f64::INFINITY });

        let err = map_solar(&solar_entry(f64::NAN, 90.0), 1).unwrap_err();
        assert!(matches!(err, MappingError::InvalidCoordinate { key, value } if key == "a" && value.is_nan()));
    }

    #[test]
    fn test_map_solar_keeps_f32_extremes() {
        let phases = map_solar(&solar_entry(-90.0, f64::from(f32::MAX)), 1).unwrap();
        assert_eq!(phases[0].azimuth_degrees, f32::MAX);
    }

    // ========================================================================
    // Time
    // ========================================================================

    #[test]
    fn test_map_time_keeps_source_order() {
        let phases = map_time(&value(TIME), 3).unwrap();
        assert_eq!(
            phases,
            vec![
                TimePhase { frame_index: 0, time: hms(6, 0, 0) },
                TimePhase { frame_index: 1, time: hms(0, 0, 0) },
                TimePhase { frame_index: 2, time: hms(18, 0, 0) },
            ]
        );
    }

    #[test]
    fn test_map_time_wraps_full_day_to_midnight() {
        let phases = map_time(&value(TIME_WRAP_ONE), 2).unwrap();
        assert_eq!(phases[0].time, hms(0, 0, 0));
        assert_eq!(phases[1].time, hms(12, 0, 0));
    }

    #[test]
    fn test_map_time_rejects_real_frame_index() {
        let err = map_time(&value(TIME_REAL_INDEX), 2).unwrap_err();
        assert_eq!(err, MappingError::WrongType("i".to_string()));
    }

    #[test]
    fn test_map_time_rejects_out_of_range_fraction() {
        let err = map_time(&value(TIME_OUT_OF_RANGE), 2).unwrap_err();
        assert_eq!(err, MappingError::InvalidTime(1.5));
    }

    #[test]
    fn test_map_time_missing_list() {
        let err = map_time(&value(APPEARANCE), 2).unwrap_err();
        assert_eq!(err, MappingError::MissingKey("ti".to_string()));
    }

    #[test]
    fn test_day_fraction_boundaries() {
        assert_eq!(time_from_day_fraction(0.0).unwrap(), hms(0, 0, 0));
        assert_eq!(time_from_day_fraction(1.0).unwrap(), hms(0, 0, 0));
        assert_eq!(time_from_day_fraction(0.5).unwrap(), hms(12, 0, 0));
        assert_eq!(time_from_day_fraction(0.25).unwrap(), hms(6, 0, 0));
        assert_eq!(time_from_day_fraction(0.333_33).unwrap(), hms(8, 0, 0));
        assert_eq!(time_from_day_fraction(0.020_83).unwrap(), hms(0, 30, 0));
    }

    #[test]
    fn test_day_fraction_rejects_invalid_values() {
        for fraction in [-0.01, 1.01, f64::NAN, f64::INFINITY] {
            assert!(matches!(time_from_day_fraction(fraction), Err(MappingError::InvalidTime(_))));
        }
    }
}
