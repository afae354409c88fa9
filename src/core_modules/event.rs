// THEORY:
// The `event` module is the output layer of the engine. It turns the continuous
// stream of scored detections into a discrete, historical record of events.
//
// Key architectural principles:
// 1.  **Two Gates**: A scored detection becomes an event only on sampled frames
//     (frame index a multiple of the sampling interval) and only when its score is
//     strictly above the minimum threat. The sampling gate bounds event volume on
//     long videos; missing either gate is the common case, not an error.
// 2.  **Immutable Records**: A `DetectionEvent` is fully populated before it is
//     appended and never touched afterwards. Identifiers start at 1 and increase
//     by one per emitted event.
// 3.  **Running Aggregates**: `AggregateStats` is updated in the same step that
//     appends the event, so the two session artifacts always agree.

use crate::core_modules::association::Association;
use crate::core_modules::behavior::Behavior;
use crate::core_modules::catalog::Category;
use crate::core_modules::detection::{Position, TrackId};
use crate::core_modules::threat::ThreatLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Gate settings for the emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Only frames whose index is a multiple of this may emit events.
    pub sampling_interval: u64,
    /// Events require a threat score strictly above this value.
    pub min_threat: u32,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            sampling_interval: 30,
            min_threat: 30,
        }
    }
}

/// Everything the engine computed for one detection in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedDetection {
    pub track_id: TrackId,
    #[serde(rename = "class")]
    pub class_name: String,
    pub category: Category,
    pub confidence: f64,
    pub center: Position,
    pub zone_id: String,
    pub zone_label: String,
    pub behavior: Behavior,
    /// Average speed in pixels/frame, one decimal.
    pub speed: f64,
    /// Number of frames the track has appeared in so far.
    pub duration_frames: usize,
    pub associations: Vec<Association>,
    pub threat_score: u32,
    pub threat_level: ThreatLevel,
}

/// An emitted security event. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionEvent {
    pub id: u64,
    pub frame_index: u64,
    /// HH:MM:SS derived from the frame index and frame rate.
    pub timestamp: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub category: Category,
    pub confidence: f64,
    pub threat_score: u32,
    pub threat_level: ThreatLevel,
    #[serde(rename = "zone")]
    pub zone_label: String,
    pub zone_id: String,
    pub behavior: Behavior,
    pub speed: f64,
    pub duration_frames: usize,
    pub associated_objects: Vec<String>,
    pub track_id: TrackId,
}

/// Running totals over the emitted events of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_detections: u64,
    pub high_threat_events: u64,
    pub medium_threat_events: u64,
    pub low_threat_events: u64,
    pub max_threat_score: u32,
    pub class_distribution: BTreeMap<String, u64>,
}

impl AggregateStats {
    fn record(&mut self, event: &DetectionEvent) {
        self.total_detections += 1;
        match event.threat_level {
            ThreatLevel::High => self.high_threat_events += 1,
            ThreatLevel::Medium => self.medium_threat_events += 1,
            ThreatLevel::Low => self.low_threat_events += 1,
        }
        self.max_threat_score = self.max_threat_score.max(event.threat_score);
        *self.class_distribution.entry(event.class_name.clone()).or_insert(0) += 1;
    }
}

/// Formats a frame position as HH:MM:SS. `fps` must be positive.
pub fn format_timestamp(frame_index: u64, fps: f64) -> String {
    let total_seconds = (frame_index as f64 / fps).floor() as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Gates scored detections into events and keeps the session's event record.
#[derive(Debug)]
pub struct EventEmitter {
    config: EmitterConfig,
    next_id: u64,
    events: Vec<DetectionEvent>,
    stats: AggregateStats,
}

impl EventEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self {
            config,
            next_id: 1,
            events: Vec::new(),
            stats: AggregateStats::default(),
        }
    }

    /// Whether the frame passes the sampling gate. A zero interval samples nothing.
    pub fn is_sampled(&self, frame_index: u64) -> bool {
        self.config.sampling_interval != 0 && frame_index % self.config.sampling_interval == 0
    }

    /// Materializes an event if both gates pass.
    pub fn offer(&mut self, frame_index: u64, fps: f64, detection: &EnrichedDetection) -> Option<DetectionEvent> {
        if !self.is_sampled(frame_index) || detection.threat_score <= self.config.min_threat {
            return None;
        }

        let event = DetectionEvent {
            id: self.next_id,
            frame_index,
            timestamp: format_timestamp(frame_index, fps),
            class_name: detection.class_name.clone(),
            category: detection.category,
            confidence: detection.confidence,
            threat_score: detection.threat_score,
            threat_level: detection.threat_level,
            zone_label: detection.zone_label.clone(),
            zone_id: detection.zone_id.clone(),
            behavior: detection.behavior,
            speed: detection.speed,
            duration_frames: detection.duration_frames,
            associated_objects: detection.associations.iter().map(|a| a.class_name.clone()).collect(),
            track_id: detection.track_id,
        };
        self.next_id += 1;

        debug!(
            event_id = event.id,
            track_id = event.track_id,
            class = %event.class_name,
            threat = event.threat_score,
            behavior = %event.behavior,
            zone = %event.zone_id,
            "event emitted"
        );

        self.stats.record(&event);
        self.events.push(event.clone());
        Some(event)
    }

    pub fn events(&self) -> &[DetectionEvent] {
        &self.events
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Hands over the event record and stats, consuming the emitter.
    pub fn into_parts(self) -> (Vec<DetectionEvent>, AggregateStats) {
        (self.events, self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(class_name: &str, threat_score: u32) -> EnrichedDetection {
        EnrichedDetection {
            track_id: 3,
            class_name: class_name.to_string(),
            category: Category::Person,
            confidence: 0.8,
            center: Position::new(10.0, 10.0),
            zone_id: "entrance".to_string(),
            zone_label: "Entrance Zone".to_string(),
            behavior: Behavior::Transient,
            speed: 1.5,
            duration_frames: 12,
            associations: vec![Association {
                class_name: "backpack".to_string(),
                distance: 20.0,
                index: 1,
            }],
            threat_score,
            threat_level: ThreatLevel::from_score(threat_score),
        }
    }

    #[test]
    fn timestamps_are_hh_mm_ss() {
        assert_eq!(format_timestamp(0, 30.0), "00:00:00");
        assert_eq!(format_timestamp(29, 30.0), "00:00:00");
        assert_eq!(format_timestamp(30, 30.0), "00:00:01");
        assert_eq!(format_timestamp(30 * 61, 30.0), "00:01:01");
        assert_eq!(format_timestamp(25 * 3725, 25.0), "01:02:05");
        assert_eq!(format_timestamp(3000, 29.97), "00:01:40");
    }

    #[test]
    fn unsampled_frames_never_emit() {
        let mut emitter = EventEmitter::new(EmitterConfig::default());
        assert!(emitter.offer(31, 30.0, &scored("person", 99)).is_none());
        assert!(emitter.events().is_empty());
        assert_eq!(emitter.stats().total_detections, 0);
    }

    #[test]
    fn threshold_is_strict() {
        let mut emitter = EventEmitter::new(EmitterConfig::default());
        assert!(emitter.offer(30, 30.0, &scored("person", 30)).is_none());
        assert!(emitter.offer(30, 30.0, &scored("person", 31)).is_some());
    }

    #[test]
    fn emitted_event_copies_enrichment() {
        let mut emitter = EventEmitter::new(EmitterConfig::default());
        let event = emitter.offer(60, 30.0, &scored("person", 57)).unwrap();
        assert_eq!(event.id, 1);
        assert_eq!(event.frame_index, 60);
        assert_eq!(event.timestamp, "00:00:02");
        assert_eq!(event.class_name, "person");
        assert_eq!(event.zone_label, "Entrance Zone");
        assert_eq!(event.zone_id, "entrance");
        assert_eq!(event.threat_level, ThreatLevel::Medium);
        assert_eq!(event.associated_objects, vec!["backpack".to_string()]);
        assert_eq!(event.duration_frames, 12);
        assert_eq!(emitter.events(), &[event]);
    }

    #[test]
    fn ids_increase_and_stats_accumulate() {
        let mut emitter = EventEmitter::new(EmitterConfig::default());
        let scores = [("person", 57), ("knife", 100), ("person", 35), ("person", 12), ("car", 75)];
        for (class_name, score) in scores {
            emitter.offer(90, 30.0, &scored(class_name, score));
        }

        let ids: Vec<u64> = emitter.events().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let stats = emitter.stats();
        assert_eq!(stats.total_detections, 4);
        assert_eq!(stats.high_threat_events, 2);
        assert_eq!(stats.medium_threat_events, 1);
        assert_eq!(stats.low_threat_events, 1);
        assert_eq!(stats.max_threat_score, 100);
        assert_eq!(stats.class_distribution.get("person"), Some(&2));
        assert_eq!(stats.class_distribution.get("knife"), Some(&1));
        assert_eq!(stats.class_distribution.get("car"), Some(&1));
    }

    #[test]
    fn custom_gates() {
        let mut emitter = EventEmitter::new(EmitterConfig {
            sampling_interval: 1,
            min_threat: 0,
        });
        assert!(emitter.offer(7, 30.0, &scored("bottle", 1)).is_some());
        assert!(emitter.offer(8, 30.0, &scored("bottle", 0)).is_none());
    }

    #[test]
    fn events_serialize_with_camel_case_keys() {
        let mut emitter = EventEmitter::new(EmitterConfig::default());
        let event = emitter.offer(30, 30.0, &scored("person", 57)).unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["class"], "person");
        assert_eq!(json["threatScore"], 57);
        assert_eq!(json["zone"], "Entrance Zone");
        assert_eq!(json["behavior"], "Transient");
        assert_eq!(json["category"], "person");
        assert_eq!(json["associatedObjects"][0], "backpack");
    }
}
