// THEORY:
// This file is the main entry point for the `sentinel_vision` library crate.
// The engine sits between an external detector/tracker and the systems that store,
// explain or forward security events. It consumes per-frame tracked detections and
// produces enriched, throttled `DetectionEvent`s plus running `AggregateStats`.
//
// The public face is `pipeline::Session` (sequential) and
// `parallel_pipeline::ParallelSession` (tokio worker pool), both configured through
// `pipeline::SessionConfig`. The components they orchestrate live in
// `core_modules`, one file per layer:
//   zone, catalog        static configuration lookups
//   track_history,
//   zone_ledger          per-track temporal state
//   behavior             kinematic classification + re-entry override
//   association          per-frame proximity query
//   threat               composite scoring
//   event                sampling/threshold gate and session record

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use crate::core_modules::behavior::Behavior;
pub use crate::core_modules::detection::{BoundingBox, Position, TrackId, TrackedDetection, TrackedFrame};
pub use crate::core_modules::event::{AggregateStats, DetectionEvent, EnrichedDetection};
pub use crate::core_modules::threat::ThreatLevel;
pub use crate::error::{Error, Result};
pub use crate::parallel_pipeline::ParallelSession;
pub use crate::pipeline::{FrameReport, Session, SessionConfig, SessionOutput};
