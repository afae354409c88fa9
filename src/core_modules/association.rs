// THEORY:
// The `association` module is the spatial grouping layer of the engine. It answers
// "what else is near this object right now?", which is how a person becomes "a
// person carrying a backpack".
//
// Key architectural principles:
// 1.  **Single-Frame Scope**: Association reads one frame's detection set and
//     nothing else. It has no memory of previous frames.
// 2.  **Center Distance**: Two detections are associated when the Euclidean
//     distance between their box centers is within the proximity radius.
//     Distance is symmetric, so the relation is too.
// 3.  **Stable Order**: Results keep the input order of the frame with the
//     reference detection removed. A brute-force scan is cheap at typical
//     per-frame detection counts.

use crate::core_modules::catalog::ClassCatalog;
use crate::core_modules::detection::TrackedDetection;
use crate::core_modules::round_to_tenth;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    /// Maximum center-to-center distance in pixels.
    pub proximity_radius: f64,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self { proximity_radius: 150.0 }
    }
}

/// Another detection of the same frame found near the reference detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub class_name: String,
    /// Center-to-center distance in pixels, rounded to one decimal.
    pub distance: f64,
    /// Position of the associated detection in the frame's detection list.
    pub index: usize,
}

pub mod association_resolver {
    use super::*;

    /// Finds every other detection within the proximity radius of `detections[reference]`.
    /// An out-of-range reference has no neighbours.
    pub fn find_associations(
        detections: &[TrackedDetection],
        reference: usize,
        catalog: &ClassCatalog,
        config: &AssociationConfig,
    ) -> Vec<Association> {
        let Some(anchor) = detections.get(reference) else {
            return Vec::new();
        };
        let anchor_center = anchor.center();

        detections
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != reference)
            .filter_map(|(i, other)| {
                let distance = anchor_center.distance_to(&other.center());
                (distance <= config.proximity_radius).then(|| Association {
                    class_name: catalog.name_of(other.class_id).to_string(),
                    distance: round_to_tenth(distance),
                    index: i,
                })
            })
            .collect()
    }
}
