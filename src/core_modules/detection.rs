// THEORY:
// The `detection` module holds the input vocabulary of the engine. Everything in
// here arrives from the external detector/tracker: a bounding box in pixel space,
// a numeric class id, a confidence, and a tracker-assigned identifier that stays
// stable while the object is in view.
//
// Key architectural principles:
// 1.  **Dumb Data Containers**: `TrackedDetection` and `TrackedFrame` describe a
//     single frame. They have no memory of earlier frames; the stateful layers
//     (`track_history`, `zone_ledger`) own everything temporal.
// 2.  **Validation at the Door**: `TrackedFrame::validate` is the only place where
//     input can be rejected. It runs before any session state is touched, so a
//     bad frame never leaves a half-updated history behind.
// 3.  **Centers, not Boxes**: Every downstream component reasons about the center
//     of the bounding box. `BoundingBox::center` is the single conversion point.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by the external tracker.
pub type TrackId = u64;

/// A point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in pixels.
    pub fn distance_to(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned box in pixel coordinates, `(x1, y1)` top-left and `(x2, y2)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn center(&self) -> Position {
        Position::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }
}

/// One tracked object in one frame, as reported by the detector/tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedDetection {
    pub bbox: BoundingBox,
    /// Detector class index, resolved to a name by the `ClassCatalog`.
    pub class_id: u32,
    /// Detector confidence in [0, 1].
    pub confidence: f64,
    pub track_id: TrackId,
}

impl TrackedDetection {
    pub fn center(&self) -> Position {
        self.bbox.center()
    }
}

/// All tracked detections of a single frame plus the frame geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedFrame {
    /// Sequential index supplied by the frame-acquisition loop.
    pub frame_index: u64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub detections: Vec<TrackedDetection>,
}

impl TrackedFrame {
    /// Rejects frames the engine cannot normalize or score.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid_input(
                self.frame_index,
                format!("frame has zero extent ({}x{})", self.width, self.height),
            ));
        }

        for (i, detection) in self.detections.iter().enumerate() {
            let bbox = &detection.bbox;
            if !bbox.is_finite() || !bbox.center().is_finite() {
                return Err(Error::invalid_input(
                    self.frame_index,
                    format!("detection {} (track {}) has non-finite box coordinates or center", i, detection.track_id),
                ));
            }
            if bbox.x2 < bbox.x1 || bbox.y2 < bbox.y1 {
                return Err(Error::invalid_input(
                    self.frame_index,
                    format!("detection {} (track {}) has an inverted box", i, detection.track_id),
                ));
            }
            if !detection.confidence.is_finite() || !(0.0..=1.0).contains(&detection.confidence) {
                return Err(Error::invalid_input(
                    self.frame_index,
                    format!(
                        "detection {} (track {}) has confidence {} outside [0, 1]",
                        i, detection.track_id, detection.confidence
                    ),
                ));
            }
        }

        Ok(())
    }
}
