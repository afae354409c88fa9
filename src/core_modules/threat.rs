// THEORY:
// The `threat` module folds everything the engine knows about a detection into a
// single integer in [0, 100]. Each factor is an independent additive contribution:
//
//     base threat of the class
//   + severity boost of the zone
//   + boost for the inferred behavior
//   + boost for each suspicious object found nearby
//   + floor(confidence * confidence weight)
//
// and the sum is clamped. The scorer is a pure function of its arguments so each
// contribution can be checked in isolation.

use crate::core_modules::association::Association;
use crate::core_modules::behavior::Behavior;
use crate::core_modules::catalog::ClassCatalog;
use crate::core_modules::zone::Zone;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_THREAT: u32 = 100;
pub const HIGH_THREAT_MIN: u32 = 70;
pub const MEDIUM_THREAT_MIN: u32 = 40;

/// Additive weights used by `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatWeights {
    pub loitering_boost: u32,
    pub evasive_boost: u32,
    pub repeated_boost: u32,
    pub transient_boost: u32,
    /// Classes that add `high_risk_association_boost` each when found nearby.
    pub high_risk_associations: Vec<String>,
    pub high_risk_association_boost: u32,
    /// Classes that add `moderate_risk_association_boost` each when found nearby.
    pub moderate_risk_associations: Vec<String>,
    pub moderate_risk_association_boost: u32,
    /// Multiplier applied to the detector confidence before flooring.
    pub confidence_weight: f64,
}

impl Default for ThreatWeights {
    fn default() -> Self {
        Self {
            loitering_boost: 25,
            evasive_boost: 20,
            repeated_boost: 15,
            transient_boost: 0,
            high_risk_associations: ["backpack", "suitcase", "knife", "scissors"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            high_risk_association_boost: 15,
            moderate_risk_associations: ["handbag", "laptop"].iter().map(|s| s.to_string()).collect(),
            moderate_risk_association_boost: 5,
            confidence_weight: 15.0,
        }
    }
}

impl ThreatWeights {
    pub fn behavior_boost(&self, behavior: Behavior) -> u32 {
        match behavior {
            Behavior::Loitering => self.loitering_boost,
            Behavior::Evasive => self.evasive_boost,
            Behavior::Repeated => self.repeated_boost,
            Behavior::Transient => self.transient_boost,
        }
    }

    /// Boost contributed by one nearby object of the given class.
    pub fn association_boost(&self, class_name: &str) -> u32 {
        if self.high_risk_associations.iter().any(|c| c == class_name) {
            self.high_risk_association_boost
        } else if self.moderate_risk_associations.iter().any(|c| c == class_name) {
            self.moderate_risk_association_boost
        } else {
            0
        }
    }
}

/// Severity band of a threat score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_THREAT_MIN {
            ThreatLevel::High
        } else if score >= MEDIUM_THREAT_MIN {
            ThreatLevel::Medium
        } else {
            ThreatLevel::Low
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThreatLevel::Low => "Low",
            ThreatLevel::Medium => "Medium",
            ThreatLevel::High => "High",
        };
        f.write_str(name)
    }
}

/// Composite threat score, always in [0, 100].
pub fn score(
    catalog: &ClassCatalog,
    weights: &ThreatWeights,
    class_name: &str,
    zone: &Zone,
    behavior: Behavior,
    associated: &[Association],
    confidence: f64,
) -> u32 {
    let base = catalog.base_threat(class_name) as i64;
    let zone_boost = zone.severity_boost as i64;
    let behavior_boost = weights.behavior_boost(behavior) as i64;
    let association_boost: i64 = associated
        .iter()
        .map(|a| weights.association_boost(&a.class_name) as i64)
        .sum();
    // `as` saturates, and NaN becomes 0.
    let confidence_boost = (confidence * weights.confidence_weight).floor() as i64;

    let total = base
        .saturating_add(zone_boost)
        .saturating_add(behavior_boost)
        .saturating_add(association_boost)
        .saturating_add(confidence_boost);

    total.clamp(0, MAX_THREAT as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::zone::ZoneMap;

    fn zone_by_id(map: &ZoneMap, id: &str) -> Zone {
        map.zones().iter().find(|z| z.id == id).cloned().unwrap()
    }

    fn nearby(names: &[&str]) -> Vec<Association> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Association {
                class_name: n.to_string(),
                distance: 10.0,
                index: i,
            })
            .collect()
    }

    #[test]
    fn bottle_in_public_area() {
        let catalog = ClassCatalog::default();
        let weights = ThreatWeights::default();
        let public = Zone::public_area();
        let s = score(&catalog, &weights, "bottle", &public, Behavior::Transient, &[], 0.5);
        assert_eq!(s, 12);
    }

    #[test]
    fn person_with_backpack_at_entrance() {
        let catalog = ClassCatalog::default();
        let weights = ThreatWeights::default();
        let map = ZoneMap::default();
        let entrance = zone_by_id(&map, "entrance");
        let s = score(
            &catalog,
            &weights,
            "person",
            &entrance,
            Behavior::Transient,
            &nearby(&["backpack"]),
            0.8,
        );
        assert_eq!(s, 57);
    }

    #[test]
    fn loitering_knife_in_restricted_zone_clamps() {
        let catalog = ClassCatalog::default();
        let weights = ThreatWeights::default();
        let map = ZoneMap::default();
        let restricted = zone_by_id(&map, "restricted");
        let s = score(&catalog, &weights, "knife", &restricted, Behavior::Loitering, &[], 0.9);
        assert_eq!(s, 100);
    }

    #[test]
    fn association_boosts_sum_per_object() {
        let catalog = ClassCatalog::default();
        let weights = ThreatWeights::default();
        let public = Zone::public_area();
        // unknown base 15, 2 x 15 + 5 + 0, confidence 0.
        let s = score(
            &catalog,
            &weights,
            "giraffe",
            &public,
            Behavior::Transient,
            &nearby(&["suitcase", "knife", "laptop", "chair"]),
            0.0,
        );
        assert_eq!(s, 15 + 30 + 5);
    }

    #[test]
    fn behavior_boosts() {
        let weights = ThreatWeights::default();
        assert_eq!(weights.behavior_boost(Behavior::Loitering), 25);
        assert_eq!(weights.behavior_boost(Behavior::Evasive), 20);
        assert_eq!(weights.behavior_boost(Behavior::Repeated), 15);
        assert_eq!(weights.behavior_boost(Behavior::Transient), 0);
    }

    #[test]
    fn score_is_always_clamped() {
        let catalog = ClassCatalog::default();
        let weights = ThreatWeights::default();
        let public = Zone::public_area();
        let crowd = nearby(&["knife"; 50]);
        let alone: Vec<Association> = Vec::new();
        for confidence in [f64::NEG_INFINITY, -1e12, -3.0, 0.0, 0.5, 1.0, 7.0, 1e12, f64::INFINITY, f64::NAN] {
            for behavior in [Behavior::Transient, Behavior::Loitering, Behavior::Evasive, Behavior::Repeated] {
                for assoc in [&alone[..], &crowd[..]] {
                    let s = score(&catalog, &weights, "knife", &public, behavior, assoc, confidence);
                    assert!(s <= MAX_THREAT);
                }
            }
        }
        let s = score(&catalog, &weights, "bottle", &public, Behavior::Transient, &[], -1e12);
        assert_eq!(s, 0);
    }

    #[test]
    fn threat_level_bands() {
        assert_eq!(ThreatLevel::from_score(0), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_score(39), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_score(40), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(69), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(70), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_score(100), ThreatLevel::High);
    }
}
