// THEORY:
// The `zone` module is the static spatial vocabulary of the engine. A `Zone` is a
// named rectangle in normalized frame coordinates, so a single configuration works
// for any camera resolution. The `ZoneMap` is the ordered list of configured zones
// plus the implicit "Public Area" fallback.
//
// Classification is a pure lookup: normalize the point by the frame size, walk the
// zones in declaration order, and return the first one whose rectangle contains
// the point (bounds inclusive). Overlapping zones are legal; declaration order is
// the tie-breaker. A point outside every configured zone lands in the fallback.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const PUBLIC_ZONE_ID: &str = "public";
pub const PUBLIC_ZONE_LABEL: &str = "Public Area";

/// An axis-aligned rectangle in normalized coordinates, each component in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneRect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl ZoneRect {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }

    /// Inclusive containment test.
    pub fn contains(&self, nx: f64, ny: f64) -> bool {
        nx >= self.x_min && nx <= self.x_max && ny >= self.y_min && ny <= self.y_max
    }

    fn is_well_formed(&self) -> bool {
        let unit = 0.0..=1.0;
        unit.contains(&self.x_min)
            && unit.contains(&self.x_max)
            && unit.contains(&self.y_min)
            && unit.contains(&self.y_max)
            && self.x_min <= self.x_max
            && self.y_min <= self.y_max
    }
}

/// A configured region of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub label: String,
    pub rect: ZoneRect,
    /// Added to the threat score of anything detected inside.
    pub severity_boost: u32,
    /// Informational only; scoring does not consult it.
    #[serde(default)]
    pub allowed_classes: Vec<String>,
    #[serde(default)]
    pub time_restricted: bool,
}

impl Zone {
    /// The implicit zone for points outside every configured rectangle.
    pub fn public_area() -> Self {
        Self {
            id: PUBLIC_ZONE_ID.to_string(),
            label: PUBLIC_ZONE_LABEL.to_string(),
            rect: ZoneRect::new(0.0, 0.0, 1.0, 1.0),
            severity_boost: 0,
            allowed_classes: Vec::new(),
            time_restricted: false,
        }
    }

    pub fn is_public(&self) -> bool {
        self.id == PUBLIC_ZONE_ID
    }
}

/// The ordered zone configuration of a session. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMap {
    zones: Vec<Zone>,
    fallback: Zone,
}

impl ZoneMap {
    /// Builds a map from zones in declaration order.
    pub fn new(zones: Vec<Zone>) -> Result<Self> {
        for zone in &zones {
            if !zone.rect.is_well_formed() {
                return Err(Error::InvalidConfig(format!(
                    "zone '{}' has a rectangle outside the unit square or with min > max",
                    zone.id
                )));
            }
        }
        Ok(Self {
            zones,
            fallback: Zone::public_area(),
        })
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn fallback(&self) -> &Zone {
        &self.fallback
    }

    /// Returns the first configured zone containing the pixel point, else the fallback.
    /// The frame extent must be non-zero; `TrackedFrame::validate` guarantees this.
    pub fn classify(&self, x: f64, y: f64, frame_width: u32, frame_height: u32) -> &Zone {
        let nx = x / frame_width as f64;
        let ny = y / frame_height as f64;
        self.zones
            .iter()
            .find(|zone| zone.rect.contains(nx, ny))
            .unwrap_or(&self.fallback)
    }
}

impl Default for ZoneMap {
    /// Centre "restricted", bottom "entrance" and top "perimeter" zones.
    fn default() -> Self {
        Self {
            zones: vec![
                Zone {
                    id: "restricted".to_string(),
                    label: "Restricted Zone".to_string(),
                    rect: ZoneRect::new(0.3, 0.3, 0.7, 0.7),
                    severity_boost: 30,
                    allowed_classes: Vec::new(),
                    time_restricted: true,
                },
                Zone {
                    id: "entrance".to_string(),
                    label: "Entrance Zone".to_string(),
                    rect: ZoneRect::new(0.0, 0.8, 1.0, 1.0),
                    severity_boost: 10,
                    allowed_classes: vec!["person".to_string(), "bicycle".to_string()],
                    time_restricted: false,
                },
                Zone {
                    id: "perimeter".to_string(),
                    label: "Perimeter Zone".to_string(),
                    rect: ZoneRect::new(0.0, 0.0, 1.0, 0.15),
                    severity_boost: 20,
                    allowed_classes: Vec::new(),
                    time_restricted: false,
                },
            ],
            fallback: Zone::public_area(),
        }
    }
}
