//! Frame selection for each phase kind.
//!
//! All functions here are pure: they read an environment snapshot and a phase
//! set and return the frame to display. Callers build a fresh
//! [`CurrentEnvironment`] on every refresh tick.

use chrono::{Local, NaiveTime};
use rand::Rng;

use super::model::{AppearancePhase, FrameIndex, NonEmpty, PhaseSet, SolarPhase, TimePhase, WallpaperDefinition};

/// Snapshot of the environment a frame is chosen for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentEnvironment {
    pub now: NaiveTime,
    pub is_light_theme_enabled: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CurrentEnvironment {
    #[must_use]
    pub const fn new(now: NaiveTime, is_light_theme_enabled: bool) -> Self {
        Self {
            now,
            is_light_theme_enabled,
            latitude: None,
            longitude: None,
        }
    }

    /// Captures the current local wall-clock time.
    #[must_use]
    pub fn capture(is_light_theme_enabled: bool) -> Self { Self::new(Local::now().time(), is_light_theme_enabled) }

    #[must_use]
    pub const fn with_location(mut self, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }
}

#[must_use]
pub const fn evaluate_appearance(environment: &CurrentEnvironment, phase: &AppearancePhase) -> FrameIndex {
    if environment.is_light_theme_enabled {
        phase.light_frame_index
    } else {
        phase.dark_frame_index
    }
}

/// Picks the phase with the latest time of day not after `environment.now`.
///
/// Before the day's earliest phase, the last phase of the previous day is
/// still active, so the lookup wraps to the final entry. `phases` must be
/// sorted ascending by time, as [`WallpaperDefinition`] guarantees.
#[must_use]
pub fn evaluate_time(environment: &CurrentEnvironment, phases: &NonEmpty<TimePhase>) -> FrameIndex {
    let started = phases.partition_point(|phase| phase.time <= environment.now);
    match started {
        0 => phases.last().frame_index,
        n => phases[n - 1].frame_index,
    }
}

/// Picks one of the solar phases uniformly at random.
///
/// Sun position is not matched against the phases' elevation and azimuth.
#[must_use]
pub fn evaluate_solar<R: Rng + ?Sized>(phases: &NonEmpty<SolarPhase>, rng: &mut R) -> FrameIndex {
    phases[rng.random_range(0..phases.len())].frame_index
}

#[must_use]
pub fn evaluate_solar_with_thread_rng(phases: &NonEmpty<SolarPhase>) -> FrameIndex {
    evaluate_solar(phases, &mut rand::rng())
}

/// Evaluates a single phase set.
#[must_use]
pub fn evaluate_phase_set<R: Rng + ?Sized>(
    environment: &CurrentEnvironment,
    phase_set: PhaseSet<'_>,
    rng: &mut R,
) -> FrameIndex {
    match phase_set {
        PhaseSet::Time(phases) => evaluate_time(environment, phases),
        PhaseSet::Solar(phases) => evaluate_solar(phases, rng),
        PhaseSet::Appearance(phase) => evaluate_appearance(environment, phase),
    }
}

/// Evaluates the highest-priority phase set of `definition`.
///
/// Returns `None` when the definition carries no phases.
#[must_use]
pub fn evaluate<R: Rng + ?Sized>(
    environment: &CurrentEnvironment,
    definition: &WallpaperDefinition,
    rng: &mut R,
) -> Option<FrameIndex> {
    let phase_set = definition.phase_sets().next()?;
    let frame = evaluate_phase_set(environment, phase_set, rng);
    tracing::debug!(
        hash = definition.content_hash(),
        kind = %phase_set.kind(),
        frame,
        "evaluated wallpaper"
    );
    Some(frame)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::wallpaper::model::DefinitionParts;

    fn at(hour: u32, minute: u32) -> NaiveTime { NaiveTime::from_hms_opt(hour, minute, 0).unwrap() }

    fn env(hour: u32, minute: u32) -> CurrentEnvironment { CurrentEnvironment::new(at(hour, minute), true) }

    /// 00:00 -> 1, 06:00 -> 0, 18:00 -> 2 once sorted.
    fn day_cycle() -> WallpaperDefinition {
        WallpaperDefinition::new(DefinitionParts {
            content_hash: "00ff".to_string(),
            width: 100,
            height: 100,
            number_of_frames: 3,
            time_phases: Some(vec![
                TimePhase { frame_index: 0, time: at(6, 0) },
                TimePhase { frame_index: 2, time: at(18, 0) },
                TimePhase { frame_index: 1, time: at(0, 0) },
            ]),
            appearance_phase: Some(AppearancePhase { light_frame_index: 0, dark_frame_index: 2 }),
            ..DefinitionParts::default()
        })
        .unwrap()
    }

    fn solar_phases() -> NonEmpty<SolarPhase> {
        let phases = [(0, 0.0, 270.0), (1, -25.0, 70.0), (2, -9.0, 80.0), (3, 0.0, 90.0), (1, -25.0, 290.0)]
            .into_iter()
            .map(|(frame_index, elevation_degrees, azimuth_degrees)| SolarPhase {
                frame_index,
                elevation_degrees,
                azimuth_degrees,
            })
            .collect();
        NonEmpty::new(phases).unwrap()
    }

    // ========================================================================
    // Appearance
    // ========================================================================

    #[test]
    fn test_appearance_follows_theme() {
        let phase = AppearancePhase { light_frame_index: 0, dark_frame_index: 1 };
        for hour in [0, 6, 12, 23] {
            let light = CurrentEnvironment::new(at(hour, 0), true);
            let dark = CurrentEnvironment::new(at(hour, 0), false);
            assert_eq!(evaluate_appearance(&light, &phase), 0);
            assert_eq!(evaluate_appearance(&dark, &phase), 1);
        }
    }

    // ========================================================================
    // Time
    // ========================================================================

    #[test]
    fn test_time_picks_latest_started_phase() {
        let definition = day_cycle();
        let phases = definition.time_phases().unwrap();
        assert_eq!(evaluate_time(&env(2, 0), phases), 1);
        assert_eq!(evaluate_time(&env(7, 30), phases), 0);
        assert_eq!(evaluate_time(&env(20, 0), phases), 2);
    }

    #[test]
    fn test_time_boundaries_are_inclusive() {
        let definition = day_cycle();
        let phases = definition.time_phases().unwrap();
        assert_eq!(evaluate_time(&env(0, 0), phases), 1);
        assert_eq!(evaluate_time(&env(6, 0), phases), 0);
        assert_eq!(evaluate_time(&env(18, 0), phases), 2);
        assert_eq!(evaluate_time(&env(5, 59), phases), 1);
    }

    #[test]
    fn test_time_wraps_before_first_phase() {
        let phases = NonEmpty::new(vec![
            TimePhase { frame_index: 4, time: at(7, 0) },
            TimePhase { frame_index: 5, time: at(21, 0) },
        ])
        .unwrap();

        assert_eq!(evaluate_time(&env(3, 0), &phases), 5);
        assert_eq!(evaluate_time(&env(23, 59), &phases), 5);
        assert_eq!(evaluate_time(&env(12, 0), &phases), 4);
    }

    #[test]
    fn test_time_single_phase_always_selected() {
        let phases = NonEmpty::new(vec![TimePhase { frame_index: 3, time: at(12, 0) }]).unwrap();
        assert_eq!(evaluate_time(&env(1, 0), &phases), 3);
        assert_eq!(evaluate_time(&env(13, 0), &phases), 3);
    }

    // ========================================================================
    // Solar
    // ========================================================================

    #[test]
    fn test_solar_selection_is_a_member() {
        let phases = solar_phases();
        let frames: HashSet<_> = phases.iter().map(|phase| phase.frame_index).collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            assert!(frames.contains(&evaluate_solar(&phases, &mut rng)));
        }
    }

    #[test]
    fn test_solar_reaches_every_phase() {
        // One frame per phase, so every frame seen means every phase was picked.
        let phases: Vec<_> = solar_phases()
            .iter()
            .zip(10..)
            .map(|(phase, frame_index)| SolarPhase { frame_index, ..*phase })
            .collect();
        let phases = NonEmpty::new(phases).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let seen: HashSet<_> = (0..1_000).map(|_| evaluate_solar(&phases, &mut rng)).collect();
        assert_eq!(seen, HashSet::from([10, 11, 12, 13, 14]));
    }

    #[test]
    fn test_solar_with_thread_rng_is_a_member() {
        let phases = solar_phases();
        let frame = evaluate_solar_with_thread_rng(&phases);
        assert!(phases.iter().any(|phase| phase.frame_index == frame));
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    #[test]
    fn test_evaluate_prefers_time_over_appearance() {
        let mut rng = StdRng::seed_from_u64(1);
        let dark_evening = CurrentEnvironment::new(at(7, 0), false);
        assert_eq!(evaluate(&dark_evening, &day_cycle(), &mut rng), Some(0));
    }

    #[test]
    fn test_evaluate_without_phases() {
        let definition = WallpaperDefinition::new(DefinitionParts {
            width: 1,
            height: 1,
            ..DefinitionParts::default()
        })
        .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(evaluate(&env(12, 0), &definition, &mut rng), None);
    }

    #[test]
    fn test_environment_with_location() {
        let environment = env(12, 0).with_location(Some(46.2), Some(6.1));
        assert_eq!(environment.latitude, Some(46.2));
        assert_eq!(environment.longitude, Some(6.1));
        assert!(environment.is_light_theme_enabled);
    }
}
