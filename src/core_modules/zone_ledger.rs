// THEORY:
// The `zone_ledger` records *when* each track was seen in each zone. It exists for
// one question only: has this track left a zone and come back after a long absence?
//
// Every (track, zone) pair owns an ordered list of frame indices. Lists are
// append-only, and the longest gap between consecutive entries is kept alongside
// the list as it grows, so the re-entry check never rescans a long-lived track's
// full record.

use crate::core_modules::detection::TrackId;
use std::collections::HashMap;

/// Ordered frame indices at which one track was observed in one zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneVisits {
    frames: Vec<u64>,
    longest_gap: u64,
}

impl ZoneVisits {
    fn push(&mut self, frame_index: u64) {
        if let Some(&last) = self.frames.last() {
            self.longest_gap = self.longest_gap.max(frame_index.saturating_sub(last));
        }
        self.frames.push(frame_index);
    }

    pub fn frames(&self) -> &[u64] {
        &self.frames
    }

    /// Largest difference between consecutive recorded frames, 0 with fewer than two.
    pub fn longest_gap(&self) -> u64 {
        self.longest_gap
    }
}

impl FromIterator<u64> for ZoneVisits {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut visits = ZoneVisits::default();
        for frame_index in iter {
            visits.push(frame_index);
        }
        visits
    }
}

/// All zone visits of a single track, keyed by zone identifier.
pub type TrackZoneVisits = HashMap<String, ZoneVisits>;

/// Per-track, per-zone visit record for a session.
#[derive(Debug, Default)]
pub struct ZoneVisitLedger {
    tracks: HashMap<TrackId, TrackZoneVisits>,
}

impl ZoneVisitLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, track_id: TrackId, zone_id: &str, frame_index: u64) {
        let zones = self.tracks.entry(track_id).or_default();
        match zones.get_mut(zone_id) {
            Some(visits) => visits.push(frame_index),
            None => {
                zones.insert(zone_id.to_string(), std::iter::once(frame_index).collect());
            }
        }
    }

    /// Every zone the track has been seen in, or `None` for an unseen track.
    pub fn visits_of(&self, track_id: TrackId) -> Option<&TrackZoneVisits> {
        self.tracks.get(&track_id)
    }

    pub fn frames_in(&self, track_id: TrackId, zone_id: &str) -> &[u64] {
        self.tracks
            .get(&track_id)
            .and_then(|zones| zones.get(zone_id))
            .map(ZoneVisits::frames)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_frames_per_track_and_zone() {
        let mut ledger = ZoneVisitLedger::new();
        ledger.record(1, "restricted", 10);
        ledger.record(1, "restricted", 11);
        ledger.record(1, "entrance", 12);
        ledger.record(2, "restricted", 12);

        assert_eq!(ledger.frames_in(1, "restricted"), &[10, 11]);
        assert_eq!(ledger.frames_in(1, "entrance"), &[12]);
        assert_eq!(ledger.frames_in(2, "restricted"), &[12]);
        assert!(ledger.frames_in(3, "restricted").is_empty());
        assert_eq!(ledger.visits_of(1).map(|z| z.len()), Some(2));
        assert!(ledger.visits_of(3).is_none());
    }

    #[test]
    fn tracks_longest_gap_incrementally() {
        let visits: ZoneVisits = [5, 6, 7, 200, 201, 260].into_iter().collect();
        assert_eq!(visits.longest_gap(), 193);

        let single: ZoneVisits = std::iter::once(42).collect();
        assert_eq!(single.longest_gap(), 0);
    }

    #[test]
    fn longest_gap_matches_consecutive_differences() {
        let frames = [1u64, 4, 4, 30, 31, 180, 181, 333];
        let visits: ZoneVisits = frames.into_iter().collect();
        let expected = frames.windows(2).map(|w| w[1] - w[0]).max().unwrap();
        assert_eq!(visits.longest_gap(), expected);
        assert_eq!(visits.frames(), &frames);
    }
}
