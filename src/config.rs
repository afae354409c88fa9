//! File-based session configuration.
//!
//! Every field of the file is optional; anything missing keeps the value from
//! `SessionConfig::default()`. Zones are a JSON object keyed by zone id, and the
//! key order in the file is the declaration order used for first-match lookups.

use crate::core_modules::association::AssociationConfig;
use crate::core_modules::behavior::BehaviorThresholds;
use crate::core_modules::catalog::{ClassCatalog, SurveillanceClass};
use crate::core_modules::event::EmitterConfig;
use crate::core_modules::threat::ThreatWeights;
use crate::core_modules::zone::{Zone, ZoneMap, ZoneRect};
use crate::error::Result;
use crate::pipeline::SessionConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// One entry of a zone mapping, keyed externally by its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub label: String,
    /// `[x_min, y_min, x_max, y_max]` in normalized coordinates.
    pub rect: [f64; 4],
    #[serde(default)]
    pub severity_boost: u32,
    #[serde(default)]
    pub allowed_classes: Vec<String>,
    #[serde(default)]
    pub time_restricted: bool,
}

impl ZoneSpec {
    fn into_zone(self, id: String) -> Zone {
        let [x_min, y_min, x_max, y_max] = self.rect;
        Zone {
            id,
            label: self.label,
            rect: ZoneRect::new(x_min, y_min, x_max, y_max),
            severity_boost: self.severity_boost,
            allowed_classes: self.allowed_classes,
            time_restricted: self.time_restricted,
        }
    }
}

/// Builds a zone map from a zone-id → spec JSON object, preserving key order.
pub fn zones_from_map(mapping: Map<String, Value>) -> Result<ZoneMap> {
    let mut zones = Vec::with_capacity(mapping.len());
    for (id, value) in mapping {
        let spec: ZoneSpec = serde_json::from_value(value)?;
        zones.push(spec.into_zone(id));
    }
    ZoneMap::new(zones)
}

/// Parses a zone mapping from JSON text.
pub fn zones_from_json(json: &str) -> Result<ZoneMap> {
    let mapping: Map<String, Value> = serde_json::from_str(json)?;
    zones_from_map(mapping)
}

/// On-disk shape of a session configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfigFile {
    pub fps: Option<f64>,
    pub emitter: Option<EmitterConfig>,
    pub behavior: Option<BehaviorThresholds>,
    pub association: Option<AssociationConfig>,
    pub threat: Option<ThreatWeights>,
    /// Replaces the default zones when present.
    pub zones: Option<Map<String, Value>>,
    /// Replaces the detector label table when present.
    pub labels: Option<Vec<String>>,
    /// Added to (or replacing entries of) the default class profiles.
    pub classes: Vec<SurveillanceClass>,
}

impl SessionConfigFile {
    pub fn into_config(self) -> Result<SessionConfig> {
        let defaults = SessionConfig::default();

        let zones = match self.zones {
            Some(mapping) => zones_from_map(mapping)?,
            None => defaults.zones,
        };

        let mut catalog = match self.labels {
            Some(labels) => defaults.catalog.with_labels(labels),
            None => defaults.catalog,
        };
        for class in self.classes {
            catalog.insert(class);
        }

        let config = SessionConfig {
            fps: self.fps.unwrap_or(defaults.fps),
            emitter: self.emitter.unwrap_or(defaults.emitter),
            behavior: self.behavior.unwrap_or(defaults.behavior),
            association: self.association.unwrap_or(defaults.association),
            threat: self.threat.unwrap_or(defaults.threat),
            zones,
            catalog,
        };
        config.validate()?;
        Ok(config)
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SessionConfigFile = serde_json::from_str(json)?;
        file.into_config()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
