pub mod association;
pub mod behavior;
pub mod catalog;
pub mod detection;
pub mod event;
pub mod threat;
pub mod track_history;
pub mod zone;
pub mod zone_ledger;

/// Rounds to one decimal place, the precision used for speeds and distances.
pub(crate) fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
