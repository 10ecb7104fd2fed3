use std::collections::BTreeMap;

use outline::{AreaMeasurement, BoundingBox, Polygon};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

/// Size bucket of a measured area in square pixels
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq, Hash, PartialOrd, Ord
)]
pub enum AreaCategory {
    S,
    M,
    L,
    XL,
}

impl AreaCategory {
    /// Upper bounds (exclusive) of S, M and L
    pub const THRESHOLDS: [f64; 3] = [10_000.0, 90_000.0, 400_000.0];

    pub fn from_area(area: f64) -> Self {
        let [small, medium, large] = Self::THRESHOLDS;
        if area < small {
            Self::S
        } else if area < medium {
            Self::M
        } else if area < large {
            Self::L
        } else {
            Self::XL
        }
    }
}

pub fn classify_area(area: f64) -> AreaCategory {
    AreaCategory::from_area(area)
}

/// Outline stored with a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Polygon { polygon: Polygon },
    Box { bounds: BoundingBox },
}

/// One measurement at one timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnnotationRecord {
    /// Seconds from the start of the video
    pub time: f64,
    /// Square source pixels
    pub area: f64,
    pub area_category: AreaCategory,
    pub shape: Shape,
    /// `data:` URL of the frame, when captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
}

impl AnnotationRecord {
    pub fn new(time: f64, area: f64, shape: Shape) -> Self {
        Self {
            time,
            area,
            area_category: classify_area(area),
            shape,
            source_image: None,
        }
    }

    pub fn from_measurement(time: f64, measurement: AreaMeasurement) -> Self {
        Self::new(
            time,
            measurement.area,
            Shape::Polygon {
                polygon: measurement.polygon,
            },
        )
    }

    pub fn polygon(&self) -> Option<&Polygon> {
        match &self.shape {
            Shape::Polygon { polygon } => Some(polygon),
            Shape::Box { .. } => None,
        }
    }

    /// Counts towards statistics
    pub fn is_valid(&self) -> bool {
        self.area.is_finite() && self.area > 0.0
    }
}

/// Records keyed by timestamp, iterated in time order. Times are compared
/// at millisecond resolution; inserting at an existing time replaces the
/// previous record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<AnnotationRecord>", into = "Vec<AnnotationRecord>")]
pub struct Timeline {
    records: BTreeMap<i64, AnnotationRecord>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(time: f64) -> i64 {
        (time * 1000.0).round() as i64
    }

    /// Returns the record that was replaced, if any
    pub fn insert(&mut self, record: AnnotationRecord) -> Option<AnnotationRecord> {
        self.records.insert(Self::key(record.time), record)
    }

    pub fn get(&self, time: f64) -> Option<&AnnotationRecord> {
        self.records.get(&Self::key(time))
    }

    pub fn get_mut(&mut self, time: f64) -> Option<&mut AnnotationRecord> {
        self.records.get_mut(&Self::key(time))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &AnnotationRecord> {
        self.records.values()
    }

    pub fn to_vec(&self) -> Vec<AnnotationRecord> {
        self.records.values().cloned().collect()
    }
}

impl FromIterator<AnnotationRecord> for Timeline {
    fn from_iter<I: IntoIterator<Item = AnnotationRecord>>(iter: I) -> Self {
        let mut timeline = Self::new();
        for record in iter {
            timeline.insert(record);
        }
        timeline
    }
}

impl From<Vec<AnnotationRecord>> for Timeline {
    fn from(records: Vec<AnnotationRecord>) -> Self {
        records.into_iter().collect()
    }
}

impl From<Timeline> for Vec<AnnotationRecord> {
    fn from(timeline: Timeline) -> Self {
        timeline.records.into_values().collect()
    }
}
