// THEORY:
// The `track_history` module gives the engine its memory. The external tracker
// already solved data association, so unlike a blob tracker this store never
// matches detections to tracks; it only files each center under the identifier
// the tracker supplied.
//
// Key architectural principles:
// 1.  **Append-Only**: A track's history is one center per frame in which the
//     track appeared, in arrival order. Nothing is ever reordered or truncated.
// 2.  **Session Lifetime**: Histories are not pruned when a track disappears. A
//     track that returns later resumes the same history. Everything is dropped
//     together when the owning session ends.
// 3.  **Read-Only Views**: `history_of` hands out slices. Consumers derive their
//     numbers from the slice and never mutate it.

use crate::core_modules::detection::{Position, TrackId};
use std::collections::HashMap;

/// The recorded path of a single tracked object.
#[derive(Debug, Clone, Default)]
pub struct TrackHistory {
    /// Centers in arrival order.
    positions: Vec<Position>,
    /// Frame index of the first recorded center.
    first_frame: u64,
    /// Frame index of the latest recorded center.
    last_frame: u64,
}

impl TrackHistory {
    fn new(position: Position, frame_index: u64) -> Self {
        Self {
            positions: vec![position],
            first_frame: frame_index,
            last_frame: frame_index,
        }
    }

    fn push(&mut self, position: Position, frame_index: u64) {
        self.positions.push(position);
        self.last_frame = frame_index;
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Number of frames in which the track has appeared.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn first_frame(&self) -> u64 {
        self.first_frame
    }

    pub fn last_frame(&self) -> u64 {
        self.last_frame
    }
}

/// Owns every track history of a session.
#[derive(Debug, Default)]
pub struct TrackHistoryStore {
    tracks: HashMap<TrackId, TrackHistory>,
}

impl TrackHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a center to the track, creating the history on first sight.
    pub fn record(&mut self, track_id: TrackId, position: Position, frame_index: u64) {
        self.tracks
            .entry(track_id)
            .and_modify(|history| history.push(position, frame_index))
            .or_insert_with(|| TrackHistory::new(position, frame_index));
    }

    pub fn get(&self, track_id: TrackId) -> Option<&TrackHistory> {
        self.tracks.get(&track_id)
    }

    /// The full ordered path of the track, empty for an unseen track.
    pub fn history_of(&self, track_id: TrackId) -> &[Position] {
        self.tracks
            .get(&track_id)
            .map(TrackHistory::positions)
            .unwrap_or(&[])
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
