// THEORY:
// The `behavior` module turns a track's raw path into a single, explainable label.
// It is the engine's behavioral analysis layer, and it is deliberately a fixed
// heuristic rather than a learned model: every label can be traced back to a
// threshold.
//
// The classification runs in two phases, and their order matters:
// 1.  **Kinematic Phase**: Looks only at the position history. Short histories are
//     `Transient`. Long, low-displacement presence is `Loitering`. High average
//     speed is `Evasive`. Slow drift over more than a handful of frames is also
//     `Loitering`. Anything else is `Transient`.
// 2.  **Re-entry Override**: Looks only at the zone ledger. If the track has ever
//     come back to a zone after an absence longer than the re-entry window, the
//     label becomes `Repeated` no matter what the kinematic phase said.
//
// The returned speed is always the kinematic average, even when the label was
// overridden.

use crate::core_modules::detection::Position;
use crate::core_modules::round_to_tenth;
use crate::core_modules::zone_ledger::TrackZoneVisits;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inferred movement pattern of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    Transient,
    Loitering,
    Evasive,
    Repeated,
}

impl Behavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Transient => "Transient",
            Behavior::Loitering => "Loitering",
            Behavior::Evasive => "Evasive",
            Behavior::Repeated => "Repeated",
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunable thresholds for behavior inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorThresholds {
    /// Histories shorter than this are always `Transient`.
    pub min_history: usize,
    /// Minimum duration (frames) for displacement-based loitering.
    pub loiter_frames: usize,
    /// Maximum first-to-last displacement (pixels) for displacement-based loitering.
    pub loiter_radius: f64,
    /// Average speed (pixels/frame) above which a track is `Evasive`.
    pub fast_speed: f64,
    /// Average speed (pixels/frame) below which a lingering track is `Loitering`.
    pub slow_speed: f64,
    /// Duration (frames) a slow track must exceed to count as loitering.
    pub slow_min_frames: usize,
    /// A gap (frames) between visits to the same zone larger than this marks re-entry.
    pub reentry_window: u64,
}

impl BehaviorThresholds {
    pub fn validate(&self) -> Result<()> {
        if self.min_history < 2 {
            return Err(Error::InvalidConfig(format!(
                "behavior min_history must be at least 2, got {}",
                self.min_history
            )));
        }
        for (name, value) in [
            ("loiter_radius", self.loiter_radius),
            ("fast_speed", self.fast_speed),
            ("slow_speed", self.slow_speed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "behavior {} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for BehaviorThresholds {
    fn default() -> Self {
        Self {
            min_history: 3,
            loiter_frames: 60,
            loiter_radius: 50.0,
            fast_speed: 40.0,
            slow_speed: 3.0,
            slow_min_frames: 10,
            reentry_window: 150,
        }
    }
}

/// The outcome of classifying one track at one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorAssessment {
    pub behavior: Behavior,
    /// Average step speed in pixels/frame, rounded to one decimal.
    pub speed: f64,
}

/// Classifies a track from its history and zone visits.
pub fn classify(
    history: &[Position],
    zone_visits: Option<&TrackZoneVisits>,
    thresholds: &BehaviorThresholds,
) -> BehaviorAssessment {
    let (kinematic, average_speed) = classify_kinematics(history, thresholds);

    let behavior = if has_reentered(zone_visits, thresholds.reentry_window) {
        Behavior::Repeated
    } else {
        kinematic
    };

    BehaviorAssessment {
        behavior,
        speed: round_to_tenth(average_speed),
    }
}

/// Phase one: label and unrounded average speed from the path alone.
fn classify_kinematics(history: &[Position], thresholds: &BehaviorThresholds) -> (Behavior, f64) {
    // Speed needs at least one step.
    if history.len() < thresholds.min_history.max(2) {
        return (Behavior::Transient, 0.0);
    }

    let step_count = history.len() - 1;
    let total_path: f64 = history.windows(2).map(|w| w[0].distance_to(&w[1])).sum();
    let average_speed = total_path / step_count as f64;

    let duration = history.len();
    // `history` holds at least `min_history` entries here.
    let displacement = match (history.first(), history.last()) {
        (Some(first), Some(last)) => first.distance_to(last),
        _ => 0.0,
    };

    let behavior = if duration >= thresholds.loiter_frames && displacement < thresholds.loiter_radius {
        Behavior::Loitering
    } else if average_speed > thresholds.fast_speed {
        Behavior::Evasive
    } else if duration > thresholds.slow_min_frames && average_speed < thresholds.slow_speed {
        Behavior::Loitering
    } else {
        Behavior::Transient
    };

    (behavior, average_speed)
}

/// Phase two: any zone revisited after more than `window` frames away.
fn has_reentered(zone_visits: Option<&TrackZoneVisits>, window: u64) -> bool {
    zone_visits
        .map(|zones| zones.values().any(|visits| visits.longest_gap() > window))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::zone_ledger::ZoneVisits;

    fn stationary(frames: usize) -> Vec<Position> {
        vec![Position::new(320.0, 240.0); frames]
    }

    fn moving(frames: usize, step: f64) -> Vec<Position> {
        (0..frames).map(|i| Position::new(i as f64 * step, 100.0)).collect()
    }

    fn visits(zone: &str, frames: &[u64]) -> TrackZoneVisits {
        let mut zones = TrackZoneVisits::new();
        zones.insert(zone.to_string(), frames.iter().copied().collect::<ZoneVisits>());
        zones
    }

    #[test]
    fn short_history_is_transient_with_zero_speed() {
        let t = BehaviorThresholds::default();
        let result = classify(&moving(2, 100.0), None, &t);
        assert_eq!(result.behavior, Behavior::Transient);
        assert_eq!(result.speed, 0.0);

        let result = classify(&[], None, &t);
        assert_eq!(result.behavior, Behavior::Transient);
    }

    #[test]
    fn lowered_min_history_never_divides_by_zero_steps() {
        let t = BehaviorThresholds {
            min_history: 0,
            ..BehaviorThresholds::default()
        };
        let result = classify(&[], None, &t);
        assert_eq!(result.speed, 0.0);

        let t = BehaviorThresholds {
            min_history: 1,
            ..BehaviorThresholds::default()
        };
        let result = classify(&stationary(1), None, &t);
        assert_eq!(result.behavior, Behavior::Transient);
        assert_eq!(result.speed, 0.0);
    }

    #[test]
    fn thresholds_validation() {
        assert!(BehaviorThresholds::default().validate().is_ok());

        let t = BehaviorThresholds {
            min_history: 1,
            ..BehaviorThresholds::default()
        };
        assert!(matches!(t.validate(), Err(Error::InvalidConfig(_))));

        let t = BehaviorThresholds {
            fast_speed: f64::INFINITY,
            ..BehaviorThresholds::default()
        };
        assert!(t.validate().is_err());

        let t = BehaviorThresholds {
            loiter_radius: -1.0,
            ..BehaviorThresholds::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn stationary_track_over_loiter_window_is_loitering() {
        let t = BehaviorThresholds::default();
        for frames in [60, 61, 120, 500] {
            let result = classify(&stationary(frames), None, &t);
            assert_eq!(result.behavior, Behavior::Loitering);
            assert_eq!(result.speed, 0.0);
        }
    }

    #[test]
    fn slow_drift_is_loitering_after_ten_frames() {
        let t = BehaviorThresholds::default();
        // 2 px/frame over 20 frames: displacement 38 px but duration below 60.
        let result = classify(&moving(20, 2.0), None, &t);
        assert_eq!(result.behavior, Behavior::Loitering);
        assert_eq!(result.speed, 2.0);

        // Same speed but only 10 frames is not enough.
        let result = classify(&moving(10, 2.0), None, &t);
        assert_eq!(result.behavior, Behavior::Transient);
    }

    #[test]
    fn fast_track_is_evasive() {
        let t = BehaviorThresholds::default();
        let result = classify(&moving(5, 41.0), None, &t);
        assert_eq!(result.behavior, Behavior::Evasive);
        assert_eq!(result.speed, 41.0);

        // Exactly the threshold is not above it.
        let result = classify(&moving(5, 40.0), None, &t);
        assert_eq!(result.behavior, Behavior::Transient);
    }

    #[test]
    fn long_pacing_with_small_displacement_is_loitering_not_evasive() {
        let t = BehaviorThresholds::default();
        // Bouncing between two points 45 px apart: high speed, no net displacement.
        let path: Vec<Position> = (0..61)
            .map(|i| Position::new(if i % 2 == 0 { 0.0 } else { 45.0 }, 0.0))
            .collect();
        let result = classify(&path, None, &t);
        assert_eq!(result.behavior, Behavior::Loitering);
        assert_eq!(result.speed, 45.0);
    }

    #[test]
    fn moderate_movement_is_transient() {
        let t = BehaviorThresholds::default();
        let result = classify(&moving(30, 10.0), None, &t);
        assert_eq!(result.behavior, Behavior::Transient);
        assert_eq!(result.speed, 10.0);
    }

    #[test]
    fn speed_is_rounded_to_one_decimal() {
        let t = BehaviorThresholds::default();
        let path = vec![Position::new(0.0, 0.0), Position::new(1.0, 1.0), Position::new(2.0, 2.0)];
        let result = classify(&path, None, &t);
        assert_eq!(result.speed, 1.4);
    }

    #[test]
    fn reentry_overrides_kinematic_label() {
        let t = BehaviorThresholds::default();
        let zones = visits("restricted", &[1, 2, 3, 200]);
        let result = classify(&moving(4, 10.0), Some(&zones), &t);
        assert_eq!(result.behavior, Behavior::Repeated);
        // Speed still reflects the path.
        assert_eq!(result.speed, 10.0);

        // Override also beats Loitering and Evasive.
        assert_eq!(classify(&stationary(70), Some(&zones), &t).behavior, Behavior::Repeated);
        assert_eq!(classify(&moving(5, 50.0), Some(&zones), &t).behavior, Behavior::Repeated);
    }

    #[test]
    fn reentry_applies_even_to_short_histories() {
        let t = BehaviorThresholds::default();
        let zones = visits("entrance", &[10, 161]);
        let result = classify(&moving(2, 1.0), Some(&zones), &t);
        assert_eq!(result.behavior, Behavior::Repeated);
        assert_eq!(result.speed, 0.0);
    }

    #[test]
    fn gap_equal_to_window_is_not_reentry() {
        let t = BehaviorThresholds::default();
        let zones = visits("entrance", &[10, 160]);
        assert_eq!(classify(&moving(2, 1.0), Some(&zones), &t).behavior, Behavior::Transient);
    }

    #[test]
    fn any_visited_zone_can_trigger_reentry() {
        let t = BehaviorThresholds::default();
        let mut zones = visits("restricted", &[300, 301, 302]);
        zones.insert("entrance".to_string(), [1u64, 2, 299].into_iter().collect());
        assert_eq!(classify(&moving(10, 10.0), Some(&zones), &t).behavior, Behavior::Repeated);
    }
}
