//! Shared types for the anomaly detection engine

use crate::domain::error::EngineError;
use serde::{Deserialize, Serialize};

/// Class label the person-specific classifiers key on
pub const PERSON_CLASS: &str = "person";

/// Newtype wrapper for track IDs to provide type safety
///
/// Ids are seeded from class label and video timestamp so a replayed stream
/// reproduces the same ids frame for frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    /// Seed an id from a class label and a video timestamp in seconds
    pub fn seeded(class: &str, timestamp: f64) -> Self {
        TrackId(format!("{}_{}", class, (timestamp * 1000.0) as i64))
    }

    /// Disambiguate a colliding seed with a sequence suffix
    pub fn with_seq(&self, seq: u32) -> Self {
        TrackId(format!("{}_{}", self.0, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned bounding box in frame pixel coordinates
///
/// Serialized as a `[x, y, width, height]` array on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Box of the given size centered on a point
    pub fn centered(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self { x: cx - width / 2.0, y: cy - height / 2.0, width, height }
    }

    /// Center point of the box
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// All four fields finite, non-negative extent
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self { x: v[0], y: v[1], width: v[2], height: v[3] }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// One object detection as emitted by the upstream detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

impl Detection {
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        self.bbox.center()
    }

    #[inline]
    pub fn is_person(&self) -> bool {
        self.class == PERSON_CLASS
    }

    /// Reject detections the engine cannot safely process
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.class.is_empty() {
            return Err(EngineError::MalformedDetection("empty class label"));
        }
        if !self.bbox.is_valid() {
            return Err(EngineError::MalformedDetection("non-finite or negative bbox"));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(EngineError::MalformedDetection("confidence outside [0, 1]"));
        }
        Ok(())
    }
}

/// One frame of detector output, as read from a replay stream
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionFrame {
    pub frame_number: u64,
    pub timestamp: f64,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// Anomaly classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Loitering,
    AbandonedObject,
    SuspiciousMovement,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::Loitering => "loitering",
            AnomalyKind::AbandonedObject => "abandoned_object",
            AnomalyKind::SuspiciousMovement => "suspicious_movement",
        }
    }
}

/// Event severity scale; the engine only ever emits Medium and High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// A behavioral anomaly produced for one frame
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyEvent {
    pub kind: AnomalyKind,
    pub description: String,
    pub severity: Severity,
    pub start_timestamp: f64,
    pub bbox: BoundingBox,
    pub confidence: f64,
    /// Track id or candidate key that produced the event
    pub source_id: String,
}

/// Named region of the frame; accepted as opaque configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub bbox: BoundingBox,
}
