// THEORY:
// The `pipeline` module is the top-level API of the engine. A `Session` owns
// everything that lives for one processing run: the track histories, the zone
// visit ledger, the zone and class configuration, and the event emitter with its
// identifier counter. Nothing is global; two sessions never share state.
//
// Each call to `process_frame` runs the full stack for one frame, in order:
//   Stage 0: validate the frame (nothing is mutated if this fails)
//   Stage 1: append centers to track histories and zone visits to the ledger
//   Stage 2: per detection, classify behavior, resolve associations, score
//   Stage 3: offer every scored detection to the event emitter
// Frames must arrive in order because behavior depends on each track's history.

use crate::core_modules::association::{AssociationConfig, association_resolver};
use crate::core_modules::behavior::{self, BehaviorThresholds};
use crate::core_modules::catalog::ClassCatalog;
use crate::core_modules::detection::{Position, TrackId, TrackedFrame};
use crate::core_modules::event::{AggregateStats, DetectionEvent, EmitterConfig, EnrichedDetection, EventEmitter};
use crate::core_modules::threat::{self, ThreatLevel, ThreatWeights};
use crate::core_modules::track_history::TrackHistoryStore;
use crate::core_modules::zone::ZoneMap;
use crate::core_modules::zone_ledger::ZoneVisitLedger;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration for a Session, allowing for tunable behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Frame rate of the source, used only to format event timestamps.
    pub fps: f64,
    pub emitter: EmitterConfig,
    pub behavior: BehaviorThresholds,
    pub association: AssociationConfig,
    pub threat: ThreatWeights,
    pub zones: ZoneMap,
    pub catalog: ClassCatalog,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            emitter: EmitterConfig::default(),
            behavior: BehaviorThresholds::default(),
            association: AssociationConfig::default(),
            threat: ThreatWeights::default(),
            zones: ZoneMap::default(),
            catalog: ClassCatalog::default(),
        }
    }
}

impl SessionConfig {
    /// Replaces the zone configuration for this invocation.
    pub fn with_zones(mut self, zones: ZoneMap) -> Self {
        self.zones = zones;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(Error::InvalidConfig(format!("fps must be positive, got {}", self.fps)));
        }
        if self.emitter.sampling_interval == 0 {
            return Err(Error::InvalidConfig("sampling interval must be at least 1 frame".to_string()));
        }
        let radius = self.association.proximity_radius;
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "proximity radius must be a non-negative number, got {}",
                radius
            )));
        }
        self.behavior.validate()?;
        if !self.threat.confidence_weight.is_finite() {
            return Err(Error::InvalidConfig("confidence weight must be finite".to_string()));
        }
        Ok(())
    }
}

/// The outcome of processing one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub frame_index: u64,
    /// Every tracked detection of the frame with its enrichment, gated or not.
    pub detections: Vec<EnrichedDetection>,
    /// Events emitted for this frame, in detection order.
    pub events: Vec<DetectionEvent>,
}

impl FrameReport {
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

/// The two artifacts a finished session hands to storage and reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionOutput {
    pub events: Vec<DetectionEvent>,
    pub stats: AggregateStats,
}

/// The stateful, non-emitting half of a session: configuration, histories and ledger.
/// Shared by `Session` and `ParallelSession`.
#[derive(Debug)]
pub(crate) struct SceneState {
    pub(crate) config: SessionConfig,
    histories: TrackHistoryStore,
    ledger: ZoneVisitLedger,
}

impl SceneState {
    pub(crate) fn new(config: SessionConfig) -> Self {
        Self {
            config,
            histories: TrackHistoryStore::new(),
            ledger: ZoneVisitLedger::new(),
        }
    }

    /// Stage 1. The frame must already be validated.
    pub(crate) fn record_frame(&mut self, frame: &TrackedFrame) {
        for detection in &frame.detections {
            let center = detection.center();
            self.histories.record(detection.track_id, center, frame.frame_index);
            let zone = self.config.zones.classify(center.x, center.y, frame.width, frame.height);
            self.ledger.record(detection.track_id, &zone.id, frame.frame_index);
        }
    }

    /// Stage 2 for `frame.detections[index]`. Reads state only.
    pub(crate) fn enrich(&self, frame: &TrackedFrame, index: usize) -> Option<EnrichedDetection> {
        let detection = frame.detections.get(index)?;
        let config = &self.config;
        let center = detection.center();
        let class_name = config.catalog.name_of(detection.class_id);

        let zone = config.zones.classify(center.x, center.y, frame.width, frame.height);
        let history = self.histories.history_of(detection.track_id);
        let assessment = behavior::classify(history, self.ledger.visits_of(detection.track_id), &config.behavior);
        let associations =
            association_resolver::find_associations(&frame.detections, index, &config.catalog, &config.association);
        let threat_score = threat::score(
            &config.catalog,
            &config.threat,
            class_name,
            zone,
            assessment.behavior,
            &associations,
            detection.confidence,
        );

        Some(EnrichedDetection {
            track_id: detection.track_id,
            class_name: class_name.to_string(),
            category: config.catalog.category(class_name),
            confidence: detection.confidence,
            center,
            zone_id: zone.id.clone(),
            zone_label: zone.label.clone(),
            behavior: assessment.behavior,
            speed: assessment.speed,
            duration_frames: history.len(),
            associations,
            threat_score,
            threat_level: ThreatLevel::from_score(threat_score),
        })
    }

    pub(crate) fn history_of(&self, track_id: TrackId) -> &[Position] {
        self.histories.history_of(track_id)
    }

    pub(crate) fn track_count(&self) -> usize {
        self.histories.track_count()
    }
}

/// Rejects a frame with a warning so the caller's loop can decide what to do.
pub(crate) fn check_frame(frame: &TrackedFrame) -> Result<()> {
    frame.validate().inspect_err(|err| {
        warn!(frame = frame.frame_index, error = %err, "frame rejected");
    })
}

/// The main, top-level struct for the enrichment engine.
#[derive(Debug)]
pub struct Session {
    scene: SceneState,
    emitter: EventEmitter,
    frames_processed: u64,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        info!(
            zones = config.zones.zones().len(),
            sampling_interval = config.emitter.sampling_interval,
            min_threat = config.emitter.min_threat,
            fps = config.fps,
            "session started"
        );
        let emitter = EventEmitter::new(config.emitter.clone());
        Ok(Self {
            scene: SceneState::new(config),
            emitter,
            frames_processed: 0,
        })
    }

    /// Runs the full enrichment stack on one frame.
    pub fn process_frame(&mut self, frame: &TrackedFrame) -> Result<FrameReport> {
        // Stage 0: Input Validation
        check_frame(frame)?;

        // Stage 1: Temporal Bookkeeping
        self.scene.record_frame(frame);

        // Stage 2: Enrichment
        let detections: Vec<EnrichedDetection> = (0..frame.detections.len())
            .filter_map(|i| self.scene.enrich(frame, i))
            .collect();

        // Stage 3: Gated Emission
        let fps = self.scene.config.fps;
        let events = detections
            .iter()
            .filter_map(|d| self.emitter.offer(frame.frame_index, fps, d))
            .collect();

        self.frames_processed += 1;
        Ok(FrameReport {
            frame_index: frame.frame_index,
            detections,
            events,
        })
    }

    pub fn events(&self) -> &[DetectionEvent] {
        self.emitter.events()
    }

    pub fn stats(&self) -> &AggregateStats {
        self.emitter.stats()
    }

    pub fn history_of(&self, track_id: TrackId) -> &[Position] {
        self.scene.history_of(track_id)
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn config(&self) -> &SessionConfig {
        &self.scene.config
    }

    /// Ends the session. Histories and the ledger are dropped here.
    pub fn finish(self) -> SessionOutput {
        info!(
            frames = self.frames_processed,
            tracks = self.scene.track_count(),
            events = self.emitter.events().len(),
            "session finished"
        );
        let (events, stats) = self.emitter.into_parts();
        SessionOutput { events, stats }
    }
}
