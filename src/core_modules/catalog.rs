// THEORY:
// The `catalog` module answers two static questions about a detection's class:
// what is it called, and how threatening is it on its own?
//
// The upstream detector reports a class index. The catalog holds the label table
// that resolves that index to a name (the COCO label set the detector is trained
// on) and a table of `SurveillanceClass` entries that attach a category and a
// base threat value to the classes security staff care about.
//
// Both lookups have explicit default branches: an index past the label table
// resolves to "unknown", and any class without an entry gets the unknown-class
// base threat under the `Misc` category. Nothing here can fail.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const UNKNOWN_CLASS_NAME: &str = "unknown";
pub const UNKNOWN_CLASS_BASE_THREAT: u32 = 15;

/// Detector labels in class-index order.
pub const COCO_LABELS: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Person,
    Vehicle,
    CarriedObject,
    Weapon,
    Equipment,
    Animal,
    Misc,
}

/// Static threat profile of a detector class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveillanceClass {
    pub name: String,
    pub category: Category,
    /// Threat contributed by the class alone, 0-100.
    pub base_threat: u32,
}

impl SurveillanceClass {
    pub fn new(name: &str, category: Category, base_threat: u32) -> Self {
        Self {
            name: name.to_string(),
            category,
            base_threat,
        }
    }
}

/// Label table plus threat profiles for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassCatalog {
    labels: Vec<String>,
    classes: HashMap<String, SurveillanceClass>,
    unknown_base_threat: u32,
}

impl ClassCatalog {
    pub fn new(labels: Vec<String>, classes: Vec<SurveillanceClass>) -> Self {
        Self {
            labels,
            classes: classes.into_iter().map(|c| (c.name.clone(), c)).collect(),
            unknown_base_threat: UNKNOWN_CLASS_BASE_THREAT,
        }
    }

    /// Swaps the detector label table, keeping the class profiles.
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Resolves a detector class index to its label.
    pub fn name_of(&self, class_id: u32) -> &str {
        self.labels
            .get(class_id as usize)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_CLASS_NAME)
    }

    pub fn get(&self, class_name: &str) -> Option<&SurveillanceClass> {
        self.classes.get(class_name)
    }

    pub fn base_threat(&self, class_name: &str) -> u32 {
        match self.classes.get(class_name) {
            Some(class) => class.base_threat,
            None => self.unknown_base_threat,
        }
    }

    pub fn category(&self, class_name: &str) -> Category {
        match self.classes.get(class_name) {
            Some(class) => class.category,
            None => Category::Misc,
        }
    }

    /// Adds or replaces a class profile.
    pub fn insert(&mut self, class: SurveillanceClass) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for ClassCatalog {
    fn default() -> Self {
        use Category::*;
        let classes = vec![
            SurveillanceClass::new("person", Person, 20),
            SurveillanceClass::new("bicycle", Vehicle, 10),
            SurveillanceClass::new("car", Vehicle, 15),
            SurveillanceClass::new("motorcycle", Vehicle, 20),
            SurveillanceClass::new("bus", Vehicle, 10),
            SurveillanceClass::new("truck", Vehicle, 25),
            SurveillanceClass::new("backpack", CarriedObject, 25),
            SurveillanceClass::new("handbag", CarriedObject, 15),
            SurveillanceClass::new("suitcase", CarriedObject, 30),
            SurveillanceClass::new("umbrella", CarriedObject, 5),
            SurveillanceClass::new("knife", Weapon, 80),
            SurveillanceClass::new("scissors", Weapon, 60),
            SurveillanceClass::new("baseball bat", Weapon, 55),
            SurveillanceClass::new("laptop", Equipment, 10),
            SurveillanceClass::new("cell phone", Equipment, 10),
            SurveillanceClass::new("dog", Animal, 10),
            SurveillanceClass::new("cat", Animal, 5),
            SurveillanceClass::new("bird", Animal, 2),
            SurveillanceClass::new("bottle", Misc, 5),
            SurveillanceClass::new("chair", Misc, 2),
        ];
        Self::new(COCO_LABELS.iter().map(|s| s.to_string()).collect(), classes)
    }
}
